use chrono::{DateTime, Local};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::harvest::pipeline::HarvestState;
use crate::traits::{Receipt, Sink, SinkError};

/// One extracted comment. `sequence_id` is 1-based and contiguous within a
/// single extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub sequence_id: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    /// Post address without its query string.
    pub post_url: String,
    pub author: String,
    pub publish_time: Option<String>,
    pub likes: String,
    pub shares: Option<String>,
    /// Raw comment counter label, present only when the source shows it.
    pub comments_label: Option<String>,
    pub description: String,
}

impl PostMetadata {
    /// Comment total shown by the source, parsed from its counter label.
    pub fn reported_comments(&self) -> Option<u64> {
        self.comments_label.as_deref().and_then(parse_compact_count)
    }
}

/// Post counters in display order.
///
/// The source renders either `likes, shares` or `likes, comments, shares`.
/// Which one applies is guessed by [`CounterBlock::from_labels`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterBlock {
    Pair {
        likes: String,
        shares: String,
    },
    Triple {
        likes: String,
        comments: String,
        shares: String,
    },
}

impl CounterBlock {
    /// Picks the counter layout from the trailing labels.
    ///
    /// Assumes the counters are the last labels on the page and that the
    /// comment counter, when shown, sits between likes and shares. If the
    /// label three from the end starts with an integer the last three are
    /// taken; otherwise only the last two. Re-check against the live page
    /// whenever its counter rendering changes.
    ///
    /// Returns `None` when fewer than two labels are available.
    pub fn from_labels(labels: &[String]) -> Option<Self> {
        let n = labels.len();
        if n >= 3 && parse_leading_int(&labels[n - 3]).is_some() {
            return Some(CounterBlock::Triple {
                likes: labels[n - 3].clone(),
                comments: labels[n - 2].clone(),
                shares: labels[n - 1].clone(),
            });
        }
        if n >= 2 {
            return Some(CounterBlock::Pair {
                likes: labels[n - 2].clone(),
                shares: labels[n - 1].clone(),
            });
        }
        None
    }

    pub fn likes(&self) -> &str {
        match self {
            CounterBlock::Pair { likes, .. } | CounterBlock::Triple { likes, .. } => likes,
        }
    }

    pub fn shares(&self) -> &str {
        match self {
            CounterBlock::Pair { shares, .. } | CounterBlock::Triple { shares, .. } => shares,
        }
    }

    pub fn comments(&self) -> Option<&str> {
        match self {
            CounterBlock::Pair { .. } => None,
            CounterBlock::Triple { comments, .. } => Some(comments),
        }
    }
}

/// Parses an optional sign followed by leading digits, ignoring anything
/// after them (`"1.2K"` → 1, `"58"` → 58, `"K"` → `None`).
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parses a display count such as `"340"`, `"1.2K"`, `"3M"` or `"1,024"`.
pub fn parse_compact_count(raw: &str) -> Option<u64> {
    let s: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let (number, multiplier) = match s.chars().last()?.to_ascii_uppercase() {
        'K' => (&s[..s.len() - 1], 1_000f64),
        'M' => (&s[..s.len() - 1], 1_000_000f64),
        'B' => (&s[..s.len() - 1], 1_000_000_000f64),
        _ => (s.as_str(), 1f64),
    };
    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

/// Statistics about one harvest run. Not part of the serialized record.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    pub total_duration_ms: u64,
    pub first_level_duration_ms: u64,
    pub reply_duration_ms: u64,
    /// Grow/sample iterations the first-level loader needed to converge
    pub first_level_iterations: u32,
    pub reply_passes: u32,
    pub controls_activated: usize,
    /// Reply containers present after expansion (second-level threads)
    pub reply_threads: usize,
    /// Comment nodes skipped for lack of a text child
    pub skipped_nodes: usize,
    /// Last state the harvester reached: `Assembled`, or `HandedOff` once
    /// a sink accepted the record
    pub final_state: HarvestState,
}

/// The assembled output of one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub harvested_at: DateTime<Local>,
    pub metadata: PostMetadata,
    /// Comment total shown by the source, when it shows one.
    pub reported_comments: Option<u64>,
    /// Comment nodes present in the final snapshot.
    pub actual_comments: usize,
    pub comments: Vec<CommentRecord>,
    pub stats: HarvestStats,
}

impl HarvestResult {
    /// Absolute difference between reported and rendered comment totals.
    pub fn divergence(&self) -> Option<u64> {
        divergence(self.reported_comments, self.actual_comments)
    }

    pub fn to_record(&self) -> HarvestRecord<'_> {
        HarvestRecord {
            time: self.harvested_at.format("%a %b %d %Y %H:%M:%S GMT%z").to_string(),
            post_url: &self.metadata.post_url,
            publish_time: self.metadata.publish_time.as_deref(),
            post_likes: &self.metadata.likes,
            post_shares: self.metadata.shares.as_deref(),
            description: &self.metadata.description,
            reported_total_comments: self.reported_comments,
            actually_rendered_comments: self.actual_comments,
            total_comments: self.actual_comments,
            comment_text: CommentText(&self.comments),
        }
    }

    /// Serializes the record as JSON indented by four spaces.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.to_record().serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Serializes the record and hands it to `sink`. May be called again
    /// with another sink after a failure.
    pub async fn deliver<S: Sink + ?Sized>(&self, sink: &S) -> Result<Receipt, SinkError> {
        let payload = self.to_json()?;
        sink.accept(&payload).await
    }
}

pub fn divergence(reported: Option<u64>, actual: usize) -> Option<u64> {
    reported.map(|r| r.abs_diff(actual as u64))
}

/// Fixed-schema view of a [`HarvestResult`] with stable field names.
#[derive(Debug, Serialize)]
pub struct HarvestRecord<'a> {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Post URL")]
    pub post_url: &'a str,
    #[serde(rename = "Publish Time")]
    pub publish_time: Option<&'a str>,
    #[serde(rename = "Post Likes")]
    pub post_likes: &'a str,
    #[serde(rename = "Post Shares")]
    pub post_shares: Option<&'a str>,
    #[serde(rename = "Description")]
    pub description: &'a str,
    #[serde(rename = "TikTok reported total comments")]
    pub reported_total_comments: Option<u64>,
    #[serde(rename = "Actually rendered comments")]
    pub actually_rendered_comments: usize,
    #[serde(rename = "Total Comments")]
    pub total_comments: usize,
    #[serde(rename = "Comment Text")]
    pub comment_text: CommentText<'a>,
}

/// Serializes comments as an id → text map in extraction order.
#[derive(Debug)]
pub struct CommentText<'a>(pub &'a [CommentRecord]);

impl Serialize for CommentText<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for record in self.0 {
            map.serialize_entry(&record.sequence_id.to_string(), &record.text)?;
        }
        map.end()
    }
}
