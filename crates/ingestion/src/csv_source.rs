//! CSV-backed reading source with a shared synchronized cursor.
//!
//! Record format: one `sensor_id,timestamp,vehicle_count` triple per
//! line. Blank lines are skipped. A malformed line is reported as a
//! per-record error after the cursor has advanced past it, so producers
//! can skip it and keep reading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{PipelineError, Reading, ReadingSource, SensorId};
use tracing::debug;

use crate::config::SourceMetrics;

struct Cursor {
    reader: Box<dyn BufRead + Send>,
    line_no: u64,
}

/// Reading source over CSV lines, shared by all producer workers.
///
/// The cursor read is a short critical section: concurrent callers
/// strictly partition the lines between them, no duplication and no
/// omission. End of file flips a permanent exhausted flag.
pub struct CsvReadingSource {
    cursor: Mutex<Cursor>,
    exhausted: AtomicBool,
    metrics: Arc<SourceMetrics>,
}

impl CsvReadingSource {
    /// Open a CSV file as a reading source.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!(path = %path.display(), "opened csv reading source");
        Ok(Self::from_reader(BufReader::new(file)))
    }

    /// Wrap any buffered reader (in-memory buffers in tests).
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            cursor: Mutex::new(Cursor {
                reader: Box::new(reader),
                line_no: 0,
            }),
            exhausted: AtomicBool::new(false),
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    /// Shared metrics handle.
    pub fn metrics(&self) -> Arc<SourceMetrics> {
        Arc::clone(&self.metrics)
    }

    fn lock_cursor(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn parse_line(line: &str, line_no: u64) -> Result<Reading, PipelineError> {
        let mut fields = line.split(',');

        let sensor_id = next_field(&mut fields, line_no, "sensor_id")?
            .parse::<u32>()
            .map_err(|e| PipelineError::malformed_record(line_no, format!("sensor_id: {e}")))?;

        let timestamp = next_field(&mut fields, line_no, "timestamp")?
            .parse::<i64>()
            .map_err(|e| PipelineError::malformed_record(line_no, format!("timestamp: {e}")))?;

        let vehicle_count = next_field(&mut fields, line_no, "vehicle_count")?
            .parse::<u32>()
            .map_err(|e| {
                PipelineError::malformed_record(line_no, format!("vehicle_count: {e}"))
            })?;

        if fields.next().is_some() {
            return Err(PipelineError::malformed_record(
                line_no,
                "expected exactly 3 fields",
            ));
        }

        Ok(Reading {
            sensor_id: SensorId::new(sensor_id),
            timestamp,
            vehicle_count,
        })
    }
}

fn next_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line_no: u64,
    name: &str,
) -> Result<&'a str, PipelineError> {
    fields
        .next()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| PipelineError::malformed_record(line_no, format!("missing {name}")))
}

impl ReadingSource for CsvReadingSource {
    fn next_reading(&self) -> Result<Option<Reading>, PipelineError> {
        if self.exhausted.load(Ordering::Acquire) {
            return Ok(None);
        }

        let mut cursor = self.lock_cursor();
        loop {
            let mut line = String::new();
            let bytes = cursor
                .reader
                .read_line(&mut line)
                .map_err(|e| PipelineError::source_read(e.to_string()))?;

            if bytes == 0 {
                self.exhausted.store(true, Ordering::Release);
                return Ok(None);
            }

            cursor.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let line_no = cursor.line_no;
            return match Self::parse_line(trimmed, line_no) {
                Ok(reading) => {
                    self.metrics.record_read();
                    Ok(Some(reading))
                }
                Err(err) => {
                    self.metrics.record_parse_error();
                    Err(err)
                }
            };
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }
}
