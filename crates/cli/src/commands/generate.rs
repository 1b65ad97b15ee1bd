//! `generate` command implementation.

use anyhow::Result;
use tracing::info;

use contracts::MockInputConfig;
use ingestion::write_csv_file;

use crate::cli::GenerateArgs;
use crate::error::CliError;

/// Execute the `generate` command
pub fn run_generate(args: &GenerateArgs) -> Result<()> {
    if args.sensors == 0 {
        anyhow::bail!("--sensors must be at least 1");
    }
    if args.max_vehicles == 0 {
        anyhow::bail!("--max-vehicles must be at least 1");
    }
    if args.interval_secs <= 0 {
        anyhow::bail!("--interval-secs must be positive");
    }

    let config = MockInputConfig {
        sensors: args.sensors,
        samples: args.samples,
        interval_secs: args.interval_secs,
        max_vehicles: args.max_vehicles,
        seed: args.seed,
        start_timestamp: args.start_timestamp,
    };

    info!(
        output = %args.output.display(),
        sensors = config.sensors,
        samples = config.samples,
        seed = config.seed,
        "Generating dataset"
    );

    let written = write_csv_file(&args.output, &config)
        .map_err(|e| CliError::generate(args.output.display().to_string(), e.to_string()))?;

    println!(
        "Wrote {} records ({} sensors x {} samples) to {}",
        written,
        config.sensors,
        config.samples,
        args.output.display()
    );

    Ok(())
}
