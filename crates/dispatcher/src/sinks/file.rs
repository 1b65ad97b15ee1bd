//! FileSink - writes hour reports to disk
//!
//! Two formats: one JSON document per hour, or a single appended CSV
//! ranking file with one row per (hour, rank) pair.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use contracts::{HourKey, HourReport, PipelineError, ReportSink};
use tracing::{debug, error, instrument};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// One `<hour>.json` document per report
    #[default]
    Json,
    /// Appended rows in a single `ranking.csv`
    Csv,
}

impl FileFormat {
    fn from_param(value: &str) -> std::io::Result<Self> {
        match value {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unknown file sink format '{other}'"),
            )),
        }
    }
}

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,

    /// Output format
    pub format: FileFormat,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> std::io::Result<Self> {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let format = match params.get("format") {
            Some(value) => FileFormat::from_param(value)?,
            None => FileFormat::default(),
        };

        Ok(Self { base_path, format })
    }
}

/// Sink that writes hour reports to disk files
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    csv_writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        // Create base directory if it doesn't exist
        fs::create_dir_all(&config.base_path)?;

        let csv_writer = match config.format {
            FileFormat::Csv => {
                let file = File::create(config.base_path.join("ranking.csv"))?;
                let mut writer = BufWriter::new(file);
                writeln!(writer, "hour,rank,sensor_id,total")?;
                Some(writer)
            }
            FileFormat::Json => None,
        };

        Ok(Self {
            name: name.into(),
            config,
            csv_writer,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params)?;
        Self::new(name, config)
    }

    fn json_file_name(key: &HourKey) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}.json",
            key.year, key.month, key.day, key.hour
        )
    }

    fn write_report_to_disk(&mut self, report: &HourReport) -> std::io::Result<()> {
        match self.config.format {
            FileFormat::Json => {
                let path = self.config.base_path.join(Self::json_file_name(&report.key));
                let file = File::create(path)?;
                serde_json::to_writer_pretty(file, report)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            }
            FileFormat::Csv => {
                if let Some(writer) = self.csv_writer.as_mut() {
                    for (rank, entry) in report.ranked.iter().enumerate() {
                        writeln!(
                            writer,
                            "{},{},{},{}",
                            report.key,
                            rank + 1,
                            entry.sensor_id,
                            entry.total
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn persist_report(&mut self, report: &HourReport) -> Result<(), PipelineError> {
        let name = self.name.clone();
        self.write_report_to_disk(report).map_err(|e| {
            error!(sink = %name, hour = %report.key, error = %e, "Write failed");
            PipelineError::sink_write(name, e.to_string())
        })
    }
}

impl ReportSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, report),
        fields(sink = %self.name, hour = %report.key)
    )]
    async fn write(&mut self, report: &HourReport) -> Result<(), PipelineError> {
        self.persist_report(report)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), PipelineError> {
        if let Some(writer) = self.csv_writer.as_mut() {
            writer
                .flush()
                .map_err(|e| PipelineError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), PipelineError> {
        if let Some(mut writer) = self.csv_writer.take() {
            writer
                .flush()
                .map_err(|e| PipelineError::sink_write(&self.name, e.to_string()))?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
