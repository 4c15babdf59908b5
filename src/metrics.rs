//! Rendered point counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Counters {
    points: AtomicUsize,
    fine_passes: AtomicU64,
    stale_discards: AtomicU64,
    fallbacks: AtomicU64,
}

/// Shared counters describing what the fine passes produced.
///
/// The point count is the sum across channels for the current settle cycle
/// and is cleared when a new cycle starts. The remaining counters accumulate
/// for the lifetime of the pipeline. Cloning shares the same counters.
#[derive(Debug, Clone, Default)]
pub struct RenderMetrics {
    counters: Arc<Counters>,
}

impl RenderMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Points rendered in the current settle cycle.
    pub fn points(&self) -> usize {
        self.counters.points.load(Ordering::Acquire)
    }

    /// Fine passes delivered since creation.
    pub fn fine_passes(&self) -> u64 {
        self.counters.fine_passes.load(Ordering::Relaxed)
    }

    /// Results dropped because a newer request had been issued.
    pub fn stale_discards(&self) -> u64 {
        self.counters.stale_discards.load(Ordering::Relaxed)
    }

    /// Fine passes computed inline after the worker failed.
    pub fn fallbacks(&self) -> u64 {
        self.counters.fallbacks.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_points(&self) {
        self.counters.points.store(0, Ordering::Release);
    }

    pub(crate) fn add_points(&self, count: usize) {
        self.counters.points.fetch_add(count, Ordering::AcqRel);
    }

    pub(crate) fn record_fine_pass(&self) {
        self.counters.fine_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.counters.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = RenderMetrics::new();
        let other = metrics.clone();
        other.add_points(120);
        other.add_points(30);
        other.record_fine_pass();
        assert_eq!(metrics.points(), 150);
        assert_eq!(metrics.fine_passes(), 1);
        metrics.reset_points();
        assert_eq!(other.points(), 0);
        assert_eq!(other.fine_passes(), 1);
    }
}
