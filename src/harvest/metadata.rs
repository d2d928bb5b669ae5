//! Post-level attributes read from fixed landmarks once loading settles.

use chrono::{Datelike, Local};
use tracing::{debug, info};

use crate::harvest::pipeline::HarvestError;
use crate::harvest::reader::TreeReader;
use crate::model::{CounterBlock, PostMetadata};
use crate::traits::TreeSource;

/// Separator between nickname and date in the author info line.
const INFO_SEPARATOR: &str = " · ";

pub struct PostMetadataExtractor<'a, T: TreeSource> {
    reader: TreeReader<'a, T>,
}

impl<'a, T: TreeSource> PostMetadataExtractor<'a, T> {
    pub fn new(reader: TreeReader<'a, T>) -> Self {
        Self { reader }
    }

    /// Reads URL, author line, counters and description.
    ///
    /// # Errors
    ///
    /// Fails when the author info line, the description or at least two
    /// counter labels are missing. Publish time and shares are the only
    /// attributes allowed to be absent.
    pub async fn extract(&self) -> Result<PostMetadata, HarvestError> {
        let source = self.reader.source();

        let location = source.location().await?;
        let post_url = strip_query(&location).to_string();

        let info = self
            .reader
            .author_info()
            .await?
            .ok_or(HarvestError::MissingLandmark {
                landmark: "author info line",
            })?;
        let info_line = source.normalized_text(&info).await?;
        let (author, raw_date) = split_author_line(&info_line);
        let publish_time = normalize_date(raw_date);
        debug!(author = %author, raw_date = ?raw_date, "Parsed author line");

        let counter_nodes = self.reader.counters().await?;
        let tail = &counter_nodes[counter_nodes.len().saturating_sub(3)..];
        let mut labels = Vec::with_capacity(tail.len());
        for node in tail {
            labels.push(source.text(node).await?.trim().to_string());
        }
        let counters = CounterBlock::from_labels(&labels).ok_or(
            HarvestError::InsufficientCounters {
                found: counter_nodes.len(),
            },
        )?;

        let description_node =
            self.reader
                .description()
                .await?
                .ok_or(HarvestError::MissingLandmark {
                    landmark: "description",
                })?;
        let description = source.text(&description_node).await?;

        info!(
            post_url = %post_url,
            likes = counters.likes(),
            comments = ?counters.comments(),
            shares = counters.shares(),
            "Post metadata extracted"
        );

        Ok(PostMetadata {
            post_url,
            author: author.to_string(),
            publish_time,
            likes: counters.likes().to_string(),
            shares: Some(counters.shares().to_string()),
            comments_label: counters.comments().map(str::to_string),
            description,
        })
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Splits `nickname · date` into its parts. The date is `None` when the
/// line carries no separator.
pub fn split_author_line(line: &str) -> (&str, Option<&str>) {
    let mut parts = line.split(INFO_SEPARATOR);
    let author = parts.next().unwrap_or("").trim();
    let date = parts.next().map(str::trim);
    (author, date)
}

/// Normalizes a displayed publish date against the current year.
///
/// - `MM-DD` gains the current year: `"03-15"` → `"03-15-2026"`
/// - `DD-MM-YYYY` is reordered: `"15-03-2024"` → `"2024-03-15"`
/// - empty or absent input yields `None`
/// - anything else (`"2d ago"`) is returned unchanged
///
/// Two-segment dates keep their segment order: `"03-15"` becomes
/// `"03-15-<year>"`, never `"15-03-<year>"`. The page's day/month order for
/// this form has not been confirmed.
pub fn normalize_date(raw: Option<&str>) -> Option<String> {
    normalize_date_in_year(raw, Local::now().year())
}

pub fn normalize_date_in_year(raw: Option<&str>, year: i32) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    let parts: Vec<&str> = raw.split('-').collect();
    match parts.as_slice() {
        [first, second] => Some(format!("{}-{}-{}", first, second, year)),
        [day, month, full_year] => Some(format!("{}-{}-{}", full_year, month, day)),
        _ => Some(raw.to_string()),
    }
}
