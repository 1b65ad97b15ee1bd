//! Synthetic CSV dataset generator
//!
//! Writes `sensor_id,timestamp,vehicle_count` lines: for each sample
//! interval, one record per sensor. Backs the `generate` CLI command and
//! file-based tests.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use contracts::MockInputConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Write a synthetic dataset to any writer. Returns the record count.
pub fn write_csv<W: Write>(out: &mut W, config: &MockInputConfig) -> std::io::Result<u64> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut timestamp = config.start_timestamp;
    let mut written = 0u64;

    for _ in 0..config.samples {
        for sensor in 0..config.sensors {
            let vehicles = if config.max_vehicles == 0 {
                0
            } else {
                rng.random_range(0..config.max_vehicles)
            };
            writeln!(out, "{sensor},{timestamp},{vehicles}")?;
            written += 1;
        }
        timestamp += config.interval_secs;
    }

    Ok(written)
}

/// Write a synthetic dataset to a file. Returns the record count.
pub fn write_csv_file(path: impl AsRef<Path>, config: &MockInputConfig) -> std::io::Result<u64> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let written = write_csv(&mut writer, config)?;
    writer.flush()?;

    info!(
        path = %path.display(),
        records = written,
        sensors = config.sensors,
        samples = config.samples,
        "dataset written"
    );
    Ok(written)
}
