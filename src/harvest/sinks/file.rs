use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::traits::{Receipt, Sink, SinkError};

/// Writes each record to `<dir>/<uuid>.json`, creating `dir` when needed.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Sink for FileSink {
    fn sink_name(&self) -> &str {
        "file"
    }

    async fn accept(&self, payload: &str) -> Result<Receipt, SinkError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.json", Uuid::now_v7()));
        tokio::fs::write(&path, payload).await?;
        debug!(path = %path.display(), "Record written");
        Ok(Receipt {
            location: Some(path),
            bytes: payload.len(),
        })
    }
}
