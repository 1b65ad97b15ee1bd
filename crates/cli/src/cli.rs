//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Traffic Tally - concurrent traffic-flow aggregation pipeline
#[derive(Parser, Debug)]
#[command(
    name = "traffic-tally",
    author,
    version,
    about = "Concurrent traffic-flow aggregation pipeline",
    long_about = "Aggregates timestamped traffic-light readings into per-hour,\n\
                  per-sensor totals with a maintained top-N busiest-sensors\n\
                  ranking, using configurable producer and consumer worker pools\n\
                  over a bounded queue."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TRAFFIC_TALLY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TRAFFIC_TALLY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the aggregation pipeline
    Run(RunArgs),

    /// Generate a synthetic CSV dataset
    Generate(GenerateArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "tally.toml", env = "TRAFFIC_TALLY_CONFIG")]
    pub config: PathBuf,

    /// Override input CSV path from configuration
    #[arg(long, env = "TRAFFIC_TALLY_INPUT")]
    pub input: Option<PathBuf>,

    /// Override producer worker count from configuration
    #[arg(long, env = "TRAFFIC_TALLY_PRODUCERS")]
    pub producers: Option<usize>,

    /// Override consumer worker count from configuration
    #[arg(long, env = "TRAFFIC_TALLY_CONSUMERS")]
    pub consumers: Option<usize>,

    /// Override ranking depth from configuration
    #[arg(long, env = "TRAFFIC_TALLY_TOP_N")]
    pub top_n: Option<usize>,

    /// Override queue capacity from configuration
    #[arg(long, env = "TRAFFIC_TALLY_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TRAFFIC_TALLY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TRAFFIC_TALLY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `generate` command
#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    /// Output CSV path
    #[arg(short, long, default_value = "trafficData.csv")]
    pub output: PathBuf,

    /// Number of traffic lights
    #[arg(long, default_value = "10")]
    pub sensors: u32,

    /// Samples per traffic light
    #[arg(long, default_value = "288")]
    pub samples: u32,

    /// Seconds between samples
    #[arg(long, default_value = "300")]
    pub interval_secs: i64,

    /// Exclusive upper bound on vehicles per sample
    #[arg(long, default_value = "100")]
    pub max_vehicles: u32,

    /// RNG seed (fixed seed = reproducible dataset)
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Epoch seconds of the first sample
    #[arg(long, default_value = "1609459200")]
    pub start_timestamp: i64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "tally.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "tally.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
