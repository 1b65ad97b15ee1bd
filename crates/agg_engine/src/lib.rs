//! # Aggregation Engine
//!
//! Bounded multi-producer/multi-consumer pipeline core.
//!
//! Responsibilities:
//! - `BoundedQueue`: fixed-capacity ring buffer with blocking push and
//!   non-blocking pop, safe under concurrent producers and consumers
//! - `AggregationTable`: shared per-hour, per-sensor totals with a
//!   maintained top-N ranking
//! - Producer/consumer worker loops and their termination state machine
//! - `PipelineRunner`: spawns the worker threads and collects the result
//!
//! ## Usage Example
//!
//! ```ignore
//! use agg_engine::{CancelToken, PipelineRunner, RunnerConfig};
//!
//! let runner = PipelineRunner::new(RunnerConfig {
//!     producers: 2,
//!     consumers: 2,
//!     queue_capacity: 100,
//!     top_n: 5,
//! });
//!
//! let outcome = runner.run(source, CancelToken::new())?;
//! for bucket in &outcome.buckets {
//!     println!("{}: {} sensors", bucket.key, bucket.totals.len());
//! }
//! ```

mod queue;
mod runner;
mod table;
mod worker;

pub use queue::{BoundedQueue, CancelToken};
pub use runner::{PipelineRunner, RunOutcome, RunnerConfig};
pub use table::{AggregationTable, HourBucket};
pub use worker::{run_consumer, run_producer, WorkerCounters};

// Re-export contracts types
pub use contracts::{HourKey, HourReport, PipelineError, Reading, ReadingSource, SensorTotal};
