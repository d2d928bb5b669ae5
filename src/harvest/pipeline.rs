//! Harvest orchestrator.
//!
//! This module provides the [`Harvester`] coordinator that runs the harvest
//! stages strictly in order:
//! `Idle → LoadingFirstLevel → LoadingReplies → ExtractingMetadata →
//! ExtractingComments → Assembled → HandedOff`.
//!
//! - Cooperative async execution via `tokio` (no step overlaps another)
//! - Structured logging via `tracing`
//! - A run consumes its `Harvester`, so it cannot be restarted

use chrono::Local;
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::{ConfigError, HarvestConfig};
use crate::harvest::comments::CommentTreeExtractor;
use crate::harvest::loader::CommentLoader;
use crate::harvest::metadata::PostMetadataExtractor;
use crate::harvest::reader::TreeReader;
use crate::model::{HarvestResult, HarvestStats};
use crate::traits::{Receipt, Sink, SinkError, TreeError, TreeSource};

// ============================================================================
// Harvest Errors
// ============================================================================

/// Errors that abort a harvest run.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    /// The configuration failed validation
    #[error("Configuration rejected: {0}")]
    Config(#[from] ConfigError),

    /// The tree collaborator failed
    #[error("Tree access failed: {0}")]
    Tree(#[from] TreeError),

    /// A required landmark was not present in the tree
    #[error("Required landmark missing: {landmark}")]
    MissingLandmark { landmark: &'static str },

    /// Fewer than two post counters were rendered
    #[error("Expected at least 2 post counters, found {found}")]
    InsufficientCounters { found: usize },

    /// The sink refused the record. The assembled result is kept so it can
    /// be delivered again elsewhere.
    #[error("Delivery to sink '{sink}' failed: {source}")]
    Delivery {
        sink: String,
        source: SinkError,
        result: Box<HarvestResult>,
    },
}

impl HarvestError {
    /// Recovers the assembled result from a delivery failure.
    pub fn into_result(self) -> Option<HarvestResult> {
        match self {
            HarvestError::Delivery { result, .. } => Some(*result),
            _ => None,
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum HarvestState {
    #[default]
    Idle,
    LoadingFirstLevel,
    LoadingReplies,
    ExtractingMetadata,
    ExtractingComments,
    Assembled,
    HandedOff,
}

impl fmt::Display for HarvestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LoadingFirstLevel => "loading-first-level",
            Self::LoadingReplies => "loading-replies",
            Self::ExtractingMetadata => "extracting-metadata",
            Self::ExtractingComments => "extracting-comments",
            Self::Assembled => "assembled",
            Self::HandedOff => "handed-off",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Harvester
// ============================================================================

/// Sequences loading, extraction and hand-off for one post.
///
/// # Example
///
/// ```ignore
/// use comment_harvester::{FileSink, HarvestConfig, Harvester};
///
/// let harvester = Harvester::new(&browser_tab, HarvestConfig::default());
/// let result = harvester.run(&FileSink::new("raw_data")).await?;
/// println!("{} comments", result.actual_comments);
/// ```
pub struct Harvester<'a, T: TreeSource> {
    source: &'a T,
    config: HarvestConfig,
    state: HarvestState,
    stats: HarvestStats,
}

impl<'a, T: TreeSource> Harvester<'a, T> {
    pub fn new(source: &'a T, config: HarvestConfig) -> Self {
        Self {
            source,
            config,
            state: HarvestState::Idle,
            stats: HarvestStats::default(),
        }
    }

    /// Runs every stage and hands the serialized record to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Delivery`] carrying the assembled result when
    /// the sink fails; any other variant means no result was produced.
    #[instrument(skip_all, fields(sink = sink.sink_name()))]
    pub async fn run<S: Sink + ?Sized>(mut self, sink: &S) -> Result<HarvestResult, HarvestError> {
        let mut result = self.assemble().await?;

        match result.deliver(sink).await {
            Ok(receipt) => {
                self.advance(HarvestState::HandedOff);
                result.stats.final_state = self.state;
                log_receipt(sink.sink_name(), &receipt);
                Ok(result)
            }
            Err(source) => {
                warn!(error = %source, "Sink rejected harvest record");
                Err(HarvestError::Delivery {
                    sink: sink.sink_name().to_string(),
                    source,
                    result: Box::new(result),
                })
            }
        }
    }

    /// Runs every stage up to `Assembled` without delivering the record.
    /// The returned stats carry `final_state == Assembled`.
    pub async fn harvest(mut self) -> Result<HarvestResult, HarvestError> {
        self.assemble().await
    }

    #[instrument(skip_all)]
    async fn assemble(&mut self) -> Result<HarvestResult, HarvestError> {
        self.config.validate()?;
        let start = Instant::now();
        let config = self.config.clone();
        let reader = TreeReader::new(self.source, &config.selectors);
        let loader = CommentLoader::new(reader.clone(), &config);

        // ====================================================================
        // Stage 1: First-level comments
        // ====================================================================

        self.advance(HarvestState::LoadingFirstLevel);
        let stage_start = Instant::now();
        let convergence = loader.load_first_level().await?;
        self.stats.first_level_iterations = convergence.iterations;
        self.stats.first_level_duration_ms = stage_start.elapsed().as_millis() as u64;

        // ====================================================================
        // Stage 2: Replies
        // ====================================================================

        self.advance(HarvestState::LoadingReplies);
        let stage_start = Instant::now();
        let expansion = loader.expand_replies().await?;
        self.stats.reply_passes = expansion.passes;
        self.stats.controls_activated = expansion.activated;
        self.stats.reply_duration_ms = stage_start.elapsed().as_millis() as u64;

        // The snapshot is taken once both loading phases have converged and
        // is the only node set extraction sees.
        let snapshot = reader.comments().await?;
        self.stats.reply_threads = reader.reply_threads().await?.len();

        // ====================================================================
        // Stage 3: Post metadata
        // ====================================================================

        self.advance(HarvestState::ExtractingMetadata);
        let metadata = PostMetadataExtractor::new(reader.clone()).extract().await?;
        let reported = metadata.reported_comments();

        // ====================================================================
        // Stage 4: Comments
        // ====================================================================

        self.advance(HarvestState::ExtractingComments);
        let extracted = CommentTreeExtractor::new(reader)
            .extract_snapshot(&snapshot, reported)
            .await?;
        self.stats.skipped_nodes = extracted.skipped();

        self.advance(HarvestState::Assembled);
        self.stats.total_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            duration_ms = self.stats.total_duration_ms,
            comments = extracted.records.len(),
            reply_threads = self.stats.reply_threads,
            divergence = ?extracted.divergence,
            "Harvest assembled"
        );

        Ok(HarvestResult {
            harvested_at: Local::now(),
            metadata,
            reported_comments: extracted.reported_count,
            actual_comments: extracted.actual_count,
            comments: extracted.records,
            stats: self.stats.clone(),
        })
    }

    fn advance(&mut self, next: HarvestState) {
        debug_assert!(next > self.state, "harvest state may only move forward");
        info!(from = %self.state, to = %next, "Harvest state transition");
        self.state = next;
        self.stats.final_state = next;
    }
}

fn log_receipt(sink: &str, receipt: &Receipt) {
    match &receipt.location {
        Some(path) => info!(sink, bytes = receipt.bytes, path = %path.display(), "Harvest record delivered"),
        None => info!(sink, bytes = receipt.bytes, "Harvest record delivered"),
    }
}
