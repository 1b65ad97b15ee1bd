//! Producer and consumer worker loops.
//!
//! Producers pull from the shared `ReadingSource` cursor and push into
//! the bounded queue; consumers poll the queue and fold readings into the
//! aggregation table. Consumer termination follows an explicit
//! Running → Draining → Done state machine: a worker only exits after
//! observing an empty pop together with source exhaustion (or a closed
//! queue), so queued data is always drained first.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use contracts::{PipelineError, Reading, ReadingSource};
use tracing::{debug, error, trace, warn};

use crate::queue::BoundedQueue;
use crate::table::AggregationTable;

/// How long an idle consumer parks before re-polling the queue.
const IDLE_WAIT: Duration = Duration::from_millis(20);

/// Consumer termination state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsumerState {
    /// Queue had data recently, or producers may still be mid-flight
    Running,
    /// Source exhausted; consuming whatever is still queued
    Draining,
    /// Terminal
    Done,
}

/// Shared per-run worker counters
#[derive(Debug, Default)]
pub struct WorkerCounters {
    /// Readings pushed into the queue
    pub produced: AtomicU64,

    /// Readings applied to the aggregation table
    pub consumed: AtomicU64,

    /// Records skipped after a per-record error
    pub malformed: AtomicU64,

    /// Producers still running.
    ///
    /// A producer may hold a reading it pulled from the source but has
    /// not pushed yet; the source can look exhausted during that window.
    /// Consumers therefore only treat exhaustion as terminal once this
    /// reaches zero.
    pub active_producers: AtomicUsize,
}

impl WorkerCounters {
    /// Counters for a run with the given producer count.
    pub fn for_producers(producers: usize) -> Self {
        let counters = Self::default();
        counters.active_producers.store(producers, Ordering::SeqCst);
        counters
    }
}

/// Producer loop: shared cursor → bounded queue.
///
/// Returns when the source reports end of input. Malformed records are
/// skipped with a warning; any other source error is fatal and closes
/// the queue so no other worker waits forever.
pub fn run_producer(
    worker_id: usize,
    source: &dyn ReadingSource,
    queue: &BoundedQueue<Reading>,
    counters: &WorkerCounters,
) -> Result<(), PipelineError> {
    let result = producer_loop(worker_id, source, queue, counters);
    counters.active_producers.fetch_sub(1, Ordering::SeqCst);
    result
}

fn producer_loop(
    worker_id: usize,
    source: &dyn ReadingSource,
    queue: &BoundedQueue<Reading>,
    counters: &WorkerCounters,
) -> Result<(), PipelineError> {
    debug!(worker_id, "producer started");
    let mut pushed = 0u64;

    loop {
        match source.next_reading() {
            Ok(Some(reading)) => {
                if let Err(err) = queue.push(reading) {
                    // Closed or cancelled mid-flight; make sure consumers
                    // see a closed queue and drain out
                    queue.close();
                    return Err(err);
                }
                pushed += 1;
                counters.produced.fetch_add(1, Ordering::Relaxed);
                metrics::gauge!("traffic_tally_queue_depth").set(queue.len() as f64);
            }
            Ok(None) => break,
            Err(err) if err.is_per_record() => {
                counters.malformed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("traffic_tally_records_malformed_total").increment(1);
                warn!(worker_id, error = %err, "skipping malformed record");
            }
            Err(err) => {
                error!(worker_id, error = %err, "source read failed, closing queue");
                queue.close();
                return Err(err);
            }
        }
    }

    debug!(worker_id, pushed, "producer finished");
    Ok(())
}

/// Consumer loop: bounded queue → aggregation table.
///
/// Polls with `try_pop`; an empty result is transient while producers may
/// still deliver, and terminal only once the source is exhausted (or the
/// queue closed) and the queue has drained.
pub fn run_consumer(
    worker_id: usize,
    source: &dyn ReadingSource,
    queue: &BoundedQueue<Reading>,
    table: &AggregationTable,
    counters: &WorkerCounters,
) -> Result<(), PipelineError> {
    debug!(worker_id, "consumer started");
    let mut state = ConsumerState::Running;
    let mut applied = 0u64;

    while state != ConsumerState::Done {
        match queue.try_pop() {
            Some(reading) => {
                state = ConsumerState::Running;
                metrics::gauge!("traffic_tally_queue_depth").set(queue.len() as f64);
                match table.apply(&reading) {
                    Ok(()) => {
                        applied += 1;
                        counters.consumed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) if err.is_per_record() => {
                        counters.malformed.fetch_add(1, Ordering::Relaxed);
                        metrics::counter!("traffic_tally_records_malformed_total").increment(1);
                        warn!(worker_id, error = %err, "skipping unaggregatable reading");
                    }
                    Err(err) => {
                        error!(worker_id, error = %err, "aggregation failed, closing queue");
                        queue.close();
                        return Err(err);
                    }
                }
            }
            None if drained(source, queue, counters) => {
                // Empty pop observed together with exhaustion
                state = match state {
                    ConsumerState::Running => {
                        trace!(worker_id, "consumer draining");
                        ConsumerState::Draining
                    }
                    _ => ConsumerState::Done,
                };
            }
            None => {
                // Transient empty: producers may still be mid-flight
                state = ConsumerState::Running;
                queue.wait_for_data(IDLE_WAIT);
            }
        }
    }

    debug!(worker_id, applied, "consumer done");
    Ok(())
}

/// Whether an empty pop is terminal rather than transient.
///
/// Exhaustion alone is not enough: a producer that already pulled a
/// reading may not have pushed it yet, so every producer must have
/// finished too. A closed queue is always terminal.
fn drained(
    source: &dyn ReadingSource,
    queue: &BoundedQueue<Reading>,
    counters: &WorkerCounters,
) -> bool {
    queue.is_closed()
        || (source.is_exhausted() && counters.active_producers.load(Ordering::SeqCst) == 0)
}
