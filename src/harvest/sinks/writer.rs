use async_trait::async_trait;
use std::io::Write;
use tokio::sync::Mutex;

use crate::traits::{Receipt, Sink, SinkError};

/// Writes each record, newline terminated, to a wrapped writer.
///
/// Writes are blocking `std::io::Write` calls made while the async lock is
/// held. Meant for in-memory buffers and stdout; use [`FileSink`] for disk
/// output.
///
/// [`FileSink`]: crate::harvest::sinks::FileSink
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> Sink for WriterSink<W> {
    fn sink_name(&self) -> &str {
        "writer"
    }

    async fn accept(&self, payload: &str) -> Result<Receipt, SinkError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(payload.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(Receipt {
            location: None,
            bytes: payload.len(),
        })
    }
}
