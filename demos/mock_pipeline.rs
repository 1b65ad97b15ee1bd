//! Mock pipeline demo: in-memory synthetic source feeding the runner,
//! with the final reports fanned out through the dispatcher.
//!
//! ```bash
//! cargo run --bin mock_pipeline
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use agg_engine::{CancelToken, PipelineRunner, RunnerConfig};
use contracts::{MockInputConfig, SinkConfig, SinkType};
use dispatcher::create_dispatcher;
use ingestion::MockReadingSource;
use observability::RunAggregator;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .compact()
        .init();

    // Synthetic source: 8 lights, 6 hours of 5-minute samples
    let source = Arc::new(MockReadingSource::new(MockInputConfig {
        sensors: 8,
        samples: 72,
        seed: 2021,
        ..Default::default()
    }));
    info!(records = source.record_count(), "mock source ready");

    // Worker stage on blocking threads
    let runner = PipelineRunner::new(RunnerConfig {
        producers: 2,
        consumers: 2,
        queue_capacity: 64,
        top_n: 3,
    });
    let cancel = CancelToken::new();
    let outcome = tokio::task::spawn_blocking(move || runner.run(source, cancel)).await??;

    // Fan the reports out to a log sink
    let (report_tx, report_rx) = mpsc::channel(16);
    let sinks = vec![SinkConfig {
        name: "demo_log".to_string(),
        sink_type: SinkType::Log,
        queue_capacity: 16,
        params: HashMap::new(),
    }];
    let dispatcher = create_dispatcher(sinks, report_rx)?;
    let dispatcher_handle = dispatcher.spawn();

    let mut aggregator = RunAggregator::new();
    for bucket in &outcome.buckets {
        let report = bucket.report();
        aggregator.update(&report);
        report_tx.send(report).await?;
    }
    drop(report_tx);
    dispatcher_handle.await?;

    println!("{}", aggregator.summary());
    Ok(())
}
