use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Node is no longer attached to the tree: {0}")]
    Stale(String),
    #[error("Query '{pattern}' failed: {message}")]
    Query { pattern: String, message: String },
    #[error("Action failed: {0}")]
    Action(String),
    #[error("Tree unavailable: {0}")]
    Unavailable(String),
}

impl TreeError {
    /// Stale handles are expected while the source keeps mutating.
    pub fn is_stale(&self) -> bool {
        matches!(self, TreeError::Stale(_))
    }
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Sink rejected payload: {0}")]
    Rejected(String),
}

/// Live, externally mutating tree that comments are harvested from.
///
/// Implementations wrap a browser session (CDP, WebDriver) or an in-memory
/// document. Every call observes the tree as it is *now*: two identical
/// queries may return different node sets.
#[async_trait]
pub trait TreeSource: Send + Sync {
    /// Opaque handle to a node. May go stale at any time.
    type Node: Clone + Send + Sync;

    /// Returns nodes matching `pattern` in document order, searched under
    /// `scope` or under the document root when `scope` is `None`.
    async fn query(
        &self,
        pattern: &str,
        scope: Option<&Self::Node>,
    ) -> Result<Vec<Self::Node>, TreeError>;

    /// Rendered text of a node.
    async fn text(&self, node: &Self::Node) -> Result<String, TreeError>;

    /// Rendered text with line breaks collapsed to single spaces.
    async fn normalized_text(&self, node: &Self::Node) -> Result<String, TreeError> {
        let raw = self.text(node).await?;
        Ok(raw.replace("\r\n", " ").replace('\n', " "))
    }

    async fn scroll_into_view(&self, node: &Self::Node) -> Result<(), TreeError>;

    /// Primary activation (click-equivalent).
    async fn activate(&self, node: &Self::Node) -> Result<(), TreeError>;

    /// Address of the document currently loaded.
    async fn location(&self) -> Result<String, TreeError>;
}

/// Acknowledgment returned by a [`Sink`] after accepting a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Where the payload ended up, for sinks that write to a path.
    pub location: Option<PathBuf>,
    pub bytes: usize,
}

#[async_trait]
pub trait Sink: Send + Sync {
    /// Returns the sink name used in logs (e.g., "file", "writer").
    fn sink_name(&self) -> &str;

    /// Accepts one serialized harvest record.
    async fn accept(&self, payload: &str) -> Result<Receipt, SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneLine;

    #[async_trait]
    impl TreeSource for OneLine {
        type Node = ();

        async fn query(&self, _pattern: &str, _scope: Option<&()>) -> Result<Vec<()>, TreeError> {
            Ok(vec![()])
        }

        async fn text(&self, _node: &()) -> Result<String, TreeError> {
            Ok("alice\n·\n03-15".to_string())
        }

        async fn scroll_into_view(&self, _node: &()) -> Result<(), TreeError> {
            Ok(())
        }

        async fn activate(&self, _node: &()) -> Result<(), TreeError> {
            Ok(())
        }

        async fn location(&self) -> Result<String, TreeError> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_normalized_text_collapses_line_breaks() {
        let text = OneLine.normalized_text(&()).await.unwrap();
        assert_eq!(text, "alice · 03-15");
    }

    #[test]
    fn test_stale_classification() {
        assert!(TreeError::Stale("comment".into()).is_stale());
        assert!(!TreeError::Action("click".into()).is_stale());
    }
}
