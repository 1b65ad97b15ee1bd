//! Pipeline statistics and final report rendering.

use std::time::Duration;

use agg_engine::HourBucket;
use observability::RunSummary;

/// Statistics from a pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Readings pushed into the queue
    pub produced: u64,

    /// Readings applied to the aggregation table
    pub consumed: u64,

    /// Records skipped after per-record errors
    pub malformed: u64,

    /// Total duration of the worker stage
    pub duration: Duration,

    /// Number of sinks that received reports
    pub active_sinks: usize,

    /// Aggregated per-hour statistics
    pub summary: RunSummary,

    /// Final hour buckets, in first-observation order
    pub buckets: Vec<HourBucket>,
}

impl PipelineStats {
    /// Readings applied per second
    pub fn readings_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.consumed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of records that failed to parse or aggregate
    pub fn malformed_rate(&self) -> f64 {
        let total = self.consumed + self.malformed;
        if total > 0 {
            (self.malformed as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary and the final per-hour rankings
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Readings produced: {}", self.produced);
        println!("Readings applied: {}", self.consumed);
        if self.malformed > 0 {
            println!(
                "Malformed records skipped: {} ({:.2}%)",
                self.malformed,
                self.malformed_rate()
            );
        }
        println!("Throughput: {:.0} readings/s", self.readings_per_sec());
        println!("Active sinks: {}", self.active_sinks);

        println!();
        println!("{}", self.summary);

        for bucket in &self.buckets {
            println!("{}", bucket.key);
            println!("--------------------------");
            for entry in &bucket.top {
                println!(
                    "Traffic Light {:02} - {} cars.",
                    entry.sensor_id.as_u32(),
                    entry.total
                );
            }
            println!();
        }
    }
}
