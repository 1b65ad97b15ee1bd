//! Complete pipeline demo: generate a CSV dataset, aggregate it with
//! multiple workers, and print the per-hour rankings.
//!
//! ```bash
//! cargo run --bin complete_pipeline
//! ```

use std::sync::Arc;

use agg_engine::{CancelToken, PipelineRunner, RunnerConfig};
use contracts::MockInputConfig;
use ingestion::{write_csv_file, CsvReadingSource};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .compact()
        .init();

    // 1. Generate one day of synthetic traffic
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("trafficData.csv");
    let config = MockInputConfig::default();
    let records = write_csv_file(&csv_path, &config)?;
    info!(records, path = %csv_path.display(), "dataset ready");

    // 2. Aggregate it with 4 producers and 4 consumers
    let source = Arc::new(CsvReadingSource::from_path(&csv_path)?);
    let runner = PipelineRunner::new(RunnerConfig {
        producers: 4,
        consumers: 4,
        queue_capacity: 100,
        top_n: 5,
    });
    let outcome = runner.run(source, CancelToken::new())?;

    info!(
        produced = outcome.produced,
        consumed = outcome.consumed,
        hours = outcome.buckets.len(),
        duration_ms = outcome.duration.as_millis() as u64,
        "aggregation finished"
    );

    // 3. Print the per-hour rankings
    for bucket in &outcome.buckets {
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

    Ok(())
}
