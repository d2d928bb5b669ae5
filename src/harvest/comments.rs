//! Single-pass extraction of comment text from a settled snapshot.

use tracing::{debug, info, warn};

use crate::harvest::reader::TreeReader;
use crate::model::{divergence, CommentRecord};
use crate::traits::{TreeError, TreeSource};

/// Comments extracted from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedComments {
    pub records: Vec<CommentRecord>,
    /// Comment nodes in the snapshot, including ones without text
    pub actual_count: usize,
    pub reported_count: Option<u64>,
    pub divergence: Option<u64>,
}

impl ExtractedComments {
    pub fn skipped(&self) -> usize {
        self.actual_count - self.records.len()
    }
}

pub struct CommentTreeExtractor<'a, T: TreeSource> {
    reader: TreeReader<'a, T>,
}

impl<'a, T: TreeSource> CommentTreeExtractor<'a, T> {
    pub fn new(reader: TreeReader<'a, T>) -> Self {
        Self { reader }
    }

    /// Takes one snapshot of the comment nodes and extracts it.
    pub async fn extract(&self, reported_count: Option<u64>) -> Result<ExtractedComments, TreeError> {
        let snapshot = self.reader.comments().await?;
        self.extract_snapshot(&snapshot, reported_count).await
    }

    /// Walks `snapshot` in order. Nodes with a text child get the next
    /// sequence id; nodes without one are skipped and consume no id.
    pub async fn extract_snapshot(
        &self,
        snapshot: &[T::Node],
        reported_count: Option<u64>,
    ) -> Result<ExtractedComments, TreeError> {
        let mut records = Vec::with_capacity(snapshot.len());
        let mut next_id = 1u32;

        for (index, node) in snapshot.iter().enumerate() {
            match self.reader.comment_text(node).await? {
                Some(text) => {
                    records.push(CommentRecord {
                        sequence_id: next_id,
                        text,
                    });
                    next_id += 1;
                }
                None => debug!(index, "Comment node has no text, skipped"),
            }
        }

        let actual_count = snapshot.len();
        let divergence = divergence(reported_count, actual_count);

        info!(reported = ?reported_count, actual = actual_count, "Comment totals");
        if let (Some(missing @ 1..), Some(reported)) = (divergence, reported_count) {
            warn!(
                missing,
                "Missing comments (loaded {} of {})", actual_count, reported
            );
        }

        Ok(ExtractedComments {
            records,
            actual_count,
            reported_count,
            divergence,
        })
    }
}
