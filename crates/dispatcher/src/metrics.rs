//! Per-sink metrics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live counters for one sink worker
#[derive(Debug, Default)]
pub struct SinkMetrics {
    write_count: AtomicU64,
    failure_count: AtomicU64,
    dropped_count: AtomicU64,
    queue_len: AtomicUsize,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful write
    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed write
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a report dropped because the sink queue was full
    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Update the approximate queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Successful writes so far
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Failed writes so far
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Dropped reports so far
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of one sink's counters
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub queue_len: usize,
}
