//! ReadingSource trait - input stream abstraction
//!
//! Defines a unified interface for reading suppliers, decoupling producer
//! workers from concrete input implementations (CSV files, synthetic
//! generators).

use crate::{PipelineError, Reading};

/// Reading supplier shared by all producer workers
///
/// Implementations hold one shared cursor: concurrent callers strictly
/// partition the record stream between them — no record is delivered
/// twice and none is skipped.
///
/// # Design Principles
///
/// 1. **Pull model**: producers pull records at their own pace; the
///    cursor read is a short critical section, not a suspension point
/// 2. **Unified interface**: file-backed and synthetic sources use the
///    same API
/// 3. **Recoverable parse errors**: a malformed record surfaces as an
///    error while the cursor still advances, so callers may skip it and
///    keep reading
///
/// # Example
///
/// ```ignore
/// let source: Arc<dyn ReadingSource> = open_source();
/// while let Some(reading) = source.next_reading()? {
///     queue.push(reading)?;
/// }
/// assert!(source.is_exhausted());
/// ```
pub trait ReadingSource: Send + Sync {
    /// Deliver the next record, or `None` once the input is finished.
    ///
    /// Safe to call concurrently from multiple producers.
    ///
    /// # Errors
    /// `MalformedRecord` for an unparseable record (the cursor has moved
    /// past it); other errors are fatal for the calling worker.
    fn next_reading(&self) -> Result<Option<Reading>, PipelineError>;

    /// Whether every record has been delivered and the source is closed.
    ///
    /// Once true, stays true. Consumers combine this with an empty queue
    /// to decide termination.
    fn is_exhausted(&self) -> bool;
}
