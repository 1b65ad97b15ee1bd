//! Source-side metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Total records delivered
    pub records_read: AtomicU64,

    /// Total unparseable records encountered
    pub parse_errors: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivered record
    pub fn record_read(&self) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("traffic_tally_records_read_total").increment(1);
    }

    /// Record a parse error
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("traffic_tally_records_parse_errors_total").increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> SourceMetricsSnapshot {
        SourceMetricsSnapshot {
            records_read: self.records_read.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMetricsSnapshot {
    /// Total records delivered
    pub records_read: u64,

    /// Total unparseable records encountered
    pub parse_errors: u64,
}
