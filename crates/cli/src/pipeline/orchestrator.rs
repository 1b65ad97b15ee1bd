//! Pipeline orchestrator - coordinates all components.
//!
//! Wires a reading source into the thread-based aggregation runner, then
//! streams the resulting hour reports through the async dispatcher.

use std::sync::Arc;
use std::time::Duration;

use agg_engine::{CancelToken, PipelineRunner, RunOutcome, RunnerConfig};
use anyhow::{Context, Result};
use contracts::{InputMode, PipelineBlueprint, ReadingSource};
use ingestion::{CsvReadingSource, MockReadingSource};
use observability::{record_report_dispatched, record_run_totals, RunAggregator};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The pipeline blueprint configuration
    pub blueprint: PipelineBlueprint,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Cancellation token shared with the signal handler
    pub cancel: CancelToken,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Build the reading source
        let source = build_source(blueprint).context("Failed to open reading source")?;
        info!(mode = ?blueprint.input.mode, "Reading source ready");

        // Run the worker stage off the async runtime
        let outcome = self.run_workers(source).await?;

        record_run_totals(
            outcome.produced,
            outcome.consumed,
            outcome.malformed,
            outcome.duration.as_secs_f64(),
        );

        // Fan the final reports out to the configured sinks
        let stats = self.dispatch_reports(outcome).await?;

        Ok(stats)
    }

    /// Run producers and consumers on blocking threads
    async fn run_workers(&self, source: Arc<dyn ReadingSource>) -> Result<RunOutcome> {
        let blueprint = &self.config.blueprint;
        let runner = PipelineRunner::new(RunnerConfig {
            producers: blueprint.workers.producers,
            consumers: blueprint.workers.consumers,
            queue_capacity: blueprint.queue.capacity,
            top_n: blueprint.ranking.top_n,
        });

        let cancel = self.config.cancel.clone();
        let mut run_task = tokio::task::spawn_blocking(move || runner.run(source, cancel));

        let joined = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, &mut run_task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out, cancelling");
                    self.config.cancel.cancel();
                    // Workers observe the token at their next wait; the
                    // blocking task finishes shortly after
                    run_task.await
                }
            },
            None => run_task.await,
        };

        let outcome = joined
            .context("Pipeline worker task panicked")?
            .context("Pipeline execution failed")?;
        Ok(outcome)
    }

    /// Stream hour reports through the dispatcher and build run stats
    async fn dispatch_reports(&self, outcome: RunOutcome) -> Result<PipelineStats> {
        let blueprint = &self.config.blueprint;

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - hour reports will only appear in the run summary");
        }

        let (report_tx, report_rx) = mpsc::channel(blueprint.sinks.len().max(1) * 16);

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), report_rx)
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        let mut aggregator = RunAggregator::new();
        for bucket in &outcome.buckets {
            let report = bucket.report();
            aggregator.update(&report);

            let sent = report_tx.send(report).await.is_ok();
            for sink in &blueprint.sinks {
                record_report_dispatched(&sink.name, sent);
            }
            if !sent {
                warn!("Dispatcher channel closed early");
                break;
            }
        }

        // Close the channel and wait for sinks to flush
        drop(report_tx);
        let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

        Ok(PipelineStats {
            produced: outcome.produced,
            consumed: outcome.consumed,
            malformed: outcome.malformed,
            duration: outcome.duration,
            active_sinks: blueprint.sinks.len(),
            summary: aggregator.summary(),
            buckets: outcome.buckets,
        })
    }
}

/// Open the reading source described by the blueprint
fn build_source(blueprint: &PipelineBlueprint) -> Result<Arc<dyn ReadingSource>> {
    match blueprint.input.mode {
        InputMode::Csv => {
            let path = blueprint
                .input
                .path
                .as_ref()
                .context("csv input mode requires input.path")?;
            let source = CsvReadingSource::from_path(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Arc::new(source))
        }
        InputMode::Mock => Ok(Arc::new(MockReadingSource::new(
            blueprint.input.mock.clone(),
        ))),
    }
}
