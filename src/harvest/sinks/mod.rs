//! Concrete [`Sink`](crate::traits::Sink) implementations.
//!
//! - `file` - one uniquely named JSON file per record
//! - `writer` - any `std::io::Write` (stdout, in-memory buffers)

pub mod file;
pub mod writer;

pub use file::FileSink;
pub use writer::WriterSink;
