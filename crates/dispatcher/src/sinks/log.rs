//! LogSink - logs hour report summaries via tracing

use contracts::{HourReport, PipelineError, ReportSink};
use tracing::{debug, info, instrument};

/// Sink that logs report summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_report_summary(&self, report: &HourReport) {
        info!(
            sink = %self.name,
            hour = %report.key,
            sensors = report.sensor_count,
            vehicles = report.total_vehicles,
            ranked = report.ranked.len(),
            "HourReport received"
        );

        for (rank, entry) in report.ranked.iter().enumerate() {
            debug!(
                sink = %self.name,
                hour = %report.key,
                rank = rank + 1,
                sensor_id = %entry.sensor_id,
                total = entry.total,
                "ranking entry"
            );
        }
    }
}

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, report),
        fields(sink = %self.name, hour = %report.key)
    )]
    async fn write(&mut self, report: &HourReport) -> Result<(), PipelineError> {
        self.log_report_summary(report);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), PipelineError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), PipelineError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{HourKey, SensorTotal};

    fn sample_report() -> HourReport {
        HourReport {
            key: HourKey {
                year: 2021,
                month: 1,
                day: 1,
                hour: 5,
            },
            sensor_count: 1,
            total_vehicles: 9,
            ranked: vec![SensorTotal::new(2u32, 9)],
        }
    }

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let result = sink.write(&sample_report()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
