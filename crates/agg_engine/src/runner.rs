//! Pipeline runner: spawns the worker threads and collects the result.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use contracts::{PipelineError, Reading, ReadingSource};
use tracing::{error, info, instrument};

use crate::queue::{BoundedQueue, CancelToken};
use crate::table::{AggregationTable, HourBucket};
use crate::worker::{run_consumer, run_producer, WorkerCounters};

/// Runner configuration
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    /// Producer worker count (>= 1)
    pub producers: usize,

    /// Consumer worker count (>= 1)
    pub consumers: usize,

    /// Bounded queue capacity (>= 1)
    pub queue_capacity: usize,

    /// Ranking depth per hour bucket
    pub top_n: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            producers: 1,
            consumers: 1,
            queue_capacity: 100,
            top_n: 5,
        }
    }
}

/// Result of a completed pipeline run
#[derive(Debug)]
pub struct RunOutcome {
    /// All hour buckets, in first-observation order
    pub buckets: Vec<HourBucket>,

    /// Readings pushed into the queue
    pub produced: u64,

    /// Readings applied to the table
    pub consumed: u64,

    /// Records skipped after per-record errors
    pub malformed: u64,

    /// Wall-clock time from spawn to last join
    pub duration: Duration,
}

/// Spawns P producers and M consumers over one shared source, queue and
/// table, waits for all of them, and returns the aggregated result.
pub struct PipelineRunner {
    config: RunnerConfig,
}

impl PipelineRunner {
    /// Create a runner with the given configuration.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion.
    ///
    /// Workers terminate when the source is exhausted and the queue has
    /// drained; a fatal worker error closes the queue so every other
    /// worker terminates too, and the first such error is returned.
    #[instrument(
        name = "pipeline_run",
        skip(self, source, cancel),
        fields(
            producers = self.config.producers,
            consumers = self.config.consumers,
            capacity = self.config.queue_capacity,
            top_n = self.config.top_n
        )
    )]
    pub fn run(
        &self,
        source: Arc<dyn ReadingSource>,
        cancel: CancelToken,
    ) -> Result<RunOutcome, PipelineError> {
        self.validate()?;

        let start = Instant::now();
        let queue = Arc::new(BoundedQueue::new(self.config.queue_capacity, cancel));
        let table = Arc::new(AggregationTable::new(self.config.top_n));
        let counters = Arc::new(WorkerCounters::for_producers(self.config.producers));

        info!("pipeline starting");

        let mut handles = Vec::with_capacity(self.config.producers + self.config.consumers);

        for worker_id in 0..self.config.producers {
            let source = Arc::clone(&source);
            let queue = Arc::clone(&queue);
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("producer-{worker_id}"))
                .spawn(move || run_producer(worker_id, source.as_ref(), &queue, &counters))?;
            handles.push(handle);
        }

        for worker_id in 0..self.config.consumers {
            let source = Arc::clone(&source);
            let queue = Arc::clone(&queue);
            let table = Arc::clone(&table);
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("consumer-{worker_id}"))
                .spawn(move || {
                    run_consumer(worker_id, source.as_ref(), &queue, &table, &counters)
                })?;
            handles.push(handle);
        }

        // Join everything before reporting; the first worker error wins.
        let mut first_err: Option<PipelineError> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(error = %err, "worker failed");
                    first_err.get_or_insert(err);
                }
                Err(_) => {
                    error!("worker thread panicked");
                    queue.close();
                    first_err.get_or_insert(PipelineError::invariant("worker thread panicked"));
                }
            }
        }

        if let Some(err) = first_err {
            return Err(err);
        }

        let outcome = RunOutcome {
            buckets: table.snapshot(),
            produced: counters.produced.load(Ordering::Relaxed),
            consumed: counters.consumed.load(Ordering::Relaxed),
            malformed: counters.malformed.load(Ordering::Relaxed),
            duration: start.elapsed(),
        };

        info!(
            produced = outcome.produced,
            consumed = outcome.consumed,
            malformed = outcome.malformed,
            buckets = outcome.buckets.len(),
            duration_ms = outcome.duration.as_millis() as u64,
            "pipeline finished"
        );

        Ok(outcome)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.config.producers == 0 {
            return Err(PipelineError::config_validation(
                "workers.producers",
                "must be at least 1",
            ));
        }
        if self.config.consumers == 0 {
            return Err(PipelineError::config_validation(
                "workers.consumers",
                "must be at least 1",
            ));
        }
        if self.config.queue_capacity == 0 {
            return Err(PipelineError::config_validation(
                "queue.capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
