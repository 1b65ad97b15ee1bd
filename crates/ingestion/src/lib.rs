//! # Ingestion
//!
//! Reading source implementations feeding the aggregation pipeline.
//!
//! Responsibilities:
//! - `CsvReadingSource`: shared synchronized cursor over
//!   `sensor_id,timestamp,vehicle_count` CSV lines
//! - `MockReadingSource`: seeded synthetic traffic, no file required
//! - Dataset generator backing the `generate` CLI command
//! - Source-side metrics (records read, parse errors)

mod config;
mod csv_source;
mod generator;
mod mock;

pub use config::{SourceMetrics, SourceMetricsSnapshot};
pub use csv_source::CsvReadingSource;
pub use generator::{write_csv, write_csv_file};
pub use mock::MockReadingSource;

// Re-export contracts types
pub use contracts::{MockInputConfig, PipelineError, Reading, ReadingSource};
