use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counters for cross-thread watcher monitoring.
#[derive(Clone, Default)]
pub struct WatcherMetrics {
    /// Change events accepted by the completion detector.
    pub events_seen: Arc<AtomicU64>,
    /// Finished events emitted.
    pub finished_emitted: Arc<AtomicU64>,
    /// Visual poll ticks skipped because capture failed.
    pub ticks_skipped: Arc<AtomicU64>,
    /// Visual captures attempted.
    pub captures: Arc<AtomicU64>,
}

impl WatcherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self) {
        self.events_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_finished(&self) {
        self.finished_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_tick(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture(&self) {
        self.captures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_seen: self.events_seen.load(Ordering::Relaxed),
            finished_emitted: self.finished_emitted.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            captures: self.captures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_seen: u64,
    pub finished_emitted: u64,
    pub ticks_skipped: u64,
    pub captures: u64,
}
