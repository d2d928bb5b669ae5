//! Harvest module - convergence-driven comment acquisition.
//!
//! This module provides the core of the harvester:
//! - **Reading**: [`TreeReader`] named queries over the live tree
//! - **Convergence**: [`StableGrowthDetector`] and the [`Growable`] seam
//! - **Loading**: [`CommentLoader`] for first-level comments and replies
//! - **Extraction**: [`PostMetadataExtractor`], [`CommentTreeExtractor`]
//! - **Pipeline**: the [`Harvester`] state machine and [`HarvestError`]
//! - **Sinks**: [`FileSink`], [`WriterSink`]

pub mod comments;
pub mod growth;
pub mod loader;
pub mod metadata;
pub mod pipeline;
pub mod reader;
pub mod sinks;

// Re-export commonly used types
pub use comments::{CommentTreeExtractor, ExtractedComments};
pub use growth::{Convergence, Growable, StableGrowthDetector};
pub use loader::{CommentLoader, ReplyExpansion};
pub use metadata::{normalize_date, PostMetadataExtractor};
pub use pipeline::{HarvestError, HarvestState, Harvester};
pub use reader::TreeReader;
pub use sinks::{FileSink, WriterSink};
