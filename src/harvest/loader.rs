//! Drives the source until its comment thread stops growing.
//!
//! First-level comments load on scroll and are tracked with a
//! [`StableGrowthDetector`]. Replies load on activation of expand controls
//! and are drained until no control is left.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::HarvestConfig;
use crate::harvest::growth::{Convergence, Growable, StableGrowthDetector};
use crate::harvest::reader::TreeReader;
use crate::traits::{TreeError, TreeSource};

/// Outcome of the reply expansion phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyExpansion {
    pub passes: u32,
    pub activated: usize,
    /// `false` when the pass cap stopped the loop with controls remaining
    pub drained: bool,
}

pub struct CommentLoader<'a, T: TreeSource> {
    reader: TreeReader<'a, T>,
    detector: StableGrowthDetector,
    reply_delay: Duration,
    max_reply_passes: Option<u32>,
}

impl<'a, T: TreeSource> CommentLoader<'a, T> {
    pub fn new(reader: TreeReader<'a, T>, config: &HarvestConfig) -> Self {
        Self {
            reader,
            detector: StableGrowthDetector::new(
                config.first_level_patience,
                config.scroll_delay(),
            ),
            reply_delay: config.reply_delay(),
            max_reply_passes: config.max_reply_passes,
        }
    }

    /// Scrolls the comment list until the number of comment nodes stays
    /// unchanged for the configured patience.
    pub async fn load_first_level(&self) -> Result<Convergence, TreeError> {
        info!(patience = self.detector.patience(), "Loading first level comments");
        let mut feed = ScrollFeed {
            reader: self.reader.clone(),
        };
        let outcome = self.detector.converge(&mut feed).await?;
        info!(
            comments = outcome.size,
            iterations = outcome.iterations,
            "All first level comments loaded"
        );
        Ok(outcome)
    }

    /// Activates every expand control in each fresh snapshot until a query
    /// returns none. Activation removes a control and may reveal new ones,
    /// so each pass re-queries.
    pub async fn expand_replies(&self) -> Result<ReplyExpansion, TreeError> {
        let source = self.reader.source();
        let mut passes = 0u32;
        let mut activated = 0usize;

        loop {
            let controls = self.reader.expand_controls().await?;
            if controls.is_empty() {
                break;
            }
            if let Some(max) = self.max_reply_passes {
                if passes >= max {
                    warn!(
                        passes,
                        remaining = controls.len(),
                        "Reply pass cap reached with expand controls left"
                    );
                    return Ok(ReplyExpansion {
                        passes,
                        activated,
                        drained: false,
                    });
                }
            }

            passes += 1;
            for control in &controls {
                match source.activate(control).await {
                    Ok(()) => activated += 1,
                    Err(e) if e.is_stale() => debug!(error = %e, "Expand control vanished"),
                    Err(e) => return Err(e),
                }
            }
            info!(pass = passes, controls = controls.len(), "Reply loading pass");

            tokio::time::sleep(self.reply_delay).await;
        }

        info!(passes, activated, "All replies loaded");
        Ok(ReplyExpansion {
            passes,
            activated,
            drained: true,
        })
    }
}

/// Grows the first-level list by scrolling its tail into view.
struct ScrollFeed<'a, T: TreeSource> {
    reader: TreeReader<'a, T>,
}

#[async_trait]
impl<'a, T: TreeSource> Growable for ScrollFeed<'a, T> {
    type Error = TreeError;

    async fn grow(&mut self) -> Result<(), TreeError> {
        let comments = self.reader.comments().await?;
        if let Some(last) = comments.last() {
            tolerate_stale(self.reader.source().scroll_into_view(last).await)?;
        }
        Ok(())
    }

    async fn size(&mut self) -> Result<usize, TreeError> {
        let count = self.reader.comments().await?.len();
        info!(count, "Loading first level comments");
        Ok(count)
    }

    /// Nudges the loader through the list container when the tail scroll
    /// produced nothing new.
    async fn on_stall(&mut self) -> Result<(), TreeError> {
        match self.reader.comment_list().await? {
            Some(list) => tolerate_stale(self.reader.source().scroll_into_view(&list).await),
            None => {
                debug!("Comment list container not present");
                Ok(())
            }
        }
    }
}

fn tolerate_stale(result: Result<(), TreeError>) -> Result<(), TreeError> {
    match result {
        Err(e) if e.is_stale() => {
            debug!(error = %e, "Scroll target went stale");
            Ok(())
        }
        other => other,
    }
}
