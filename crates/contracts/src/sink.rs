//! ReportSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{HourReport, PipelineError};

/// Report output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ReportSink: Send)]
pub trait LocalReportSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one hour report
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, report: &HourReport) -> Result<(), PipelineError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), PipelineError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), PipelineError>;
}
