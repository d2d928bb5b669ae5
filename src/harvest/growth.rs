//! Patience-based convergence detection for sets that grow asynchronously.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A set that can be nudged to grow and measured.
#[async_trait]
pub trait Growable: Send {
    type Error: Send;

    /// Triggers growth (scroll, click, fetch).
    async fn grow(&mut self) -> Result<(), Self::Error>;

    /// Current number of items.
    async fn size(&mut self) -> Result<usize, Self::Error>;

    /// Called after an observation showed no growth.
    async fn on_stall(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Outcome of a converged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// Grow/sample iterations performed
    pub iterations: u32,
    pub size: usize,
}

/// Declares a growing set complete after `patience` consecutive
/// observations without growth.
#[derive(Debug, Clone, Copy)]
pub struct StableGrowthDetector {
    patience: u32,
    delay: Duration,
}

impl StableGrowthDetector {
    pub fn new(patience: u32, delay: Duration) -> Self {
        Self { patience, delay }
    }

    pub fn patience(&self) -> u32 {
        self.patience
    }

    /// Grows `target` until its size has stayed unchanged for `patience`
    /// consecutive samples. Any change in size, up or down, restores the
    /// full budget. Sleeps `delay` between iterations, yielding to the
    /// runtime.
    ///
    /// A target that never grows still costs exactly `patience` iterations.
    pub async fn converge<G: Growable>(&self, target: &mut G) -> Result<Convergence, G::Error> {
        let mut previous = target.size().await?;
        let mut remaining = self.patience;
        let mut iterations = 0u32;

        while remaining > 0 {
            if iterations > 0 {
                tokio::time::sleep(self.delay).await;
            }

            target.grow().await?;
            let current = target.size().await?;
            iterations += 1;

            if current != previous {
                remaining = self.patience;
            } else {
                remaining -= 1;
                target.on_stall().await?;
            }

            debug!(iteration = iterations, size = current, remaining, "Growth sample");
            previous = current;
        }

        Ok(Convergence {
            iterations,
            size: previous,
        })
    }
}
