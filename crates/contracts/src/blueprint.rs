//! PipelineBlueprint - Config Loader output
//!
//! Describes a complete pipeline run: input source, worker topology,
//! queue sizing, ranking depth, and output routing.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Input source settings
    pub input: InputConfig,

    /// Worker topology
    #[serde(default)]
    pub workers: WorkerConfig,

    /// Bounded queue settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// Ranking settings
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Output routing configuration
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Input source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Where readings come from
    pub mode: InputMode,

    /// CSV file path (csv mode)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Synthetic traffic parameters (mock mode)
    #[serde(default)]
    pub mock: MockInputConfig,
}

/// Input source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Read `sensor_id,timestamp,vehicle_count` lines from a CSV file
    Csv,
    /// Generate seeded synthetic readings in memory
    Mock,
}

/// Synthetic traffic parameters
///
/// Defaults describe one day of 5-minute samples from ten lights, the
/// same shape the dataset generator writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockInputConfig {
    /// Number of traffic lights
    #[serde(default = "default_sensors")]
    pub sensors: u32,

    /// Samples per traffic light
    #[serde(default = "default_samples")]
    pub samples: u32,

    /// Seconds between samples
    #[serde(default = "default_interval_secs")]
    pub interval_secs: i64,

    /// Exclusive upper bound on vehicles per sample
    #[serde(default = "default_max_vehicles")]
    pub max_vehicles: u32,

    /// RNG seed (fixed seed = reproducible traffic)
    #[serde(default)]
    pub seed: u64,

    /// Epoch seconds of the first sample
    #[serde(default = "default_start_timestamp")]
    pub start_timestamp: i64,
}

fn default_sensors() -> u32 {
    10
}

fn default_samples() -> u32 {
    288 // 24h of 5-minute intervals
}

fn default_interval_secs() -> i64 {
    300
}

fn default_max_vehicles() -> u32 {
    100
}

fn default_start_timestamp() -> i64 {
    1_609_459_200 // 2021-01-01 00:00:00 UTC
}

impl Default for MockInputConfig {
    fn default() -> Self {
        Self {
            sensors: default_sensors(),
            samples: default_samples(),
            interval_secs: default_interval_secs(),
            max_vehicles: default_max_vehicles(),
            seed: 0,
            start_timestamp: default_start_timestamp(),
        }
    }
}

impl MockInputConfig {
    /// Total records this configuration produces.
    pub fn record_count(&self) -> u64 {
        self.sensors as u64 * self.samples as u64
    }
}

/// Worker topology: producer and consumer counts are independent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Producer worker count, must be >= 1
    #[serde(default = "default_workers")]
    pub producers: usize,

    /// Consumer worker count, must be >= 1
    #[serde(default = "default_workers")]
    pub consumers: usize,
}

fn default_workers() -> usize {
    1
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            producers: 1,
            consumers: 1,
        }
    }
}

/// Bounded queue configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum unconsumed readings held at any instant, must be >= 1
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

/// Ranking configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Ranking depth; 0 yields empty rankings
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    5
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink kind
    pub sink_type: SinkType,

    /// Per-sink queue capacity
    #[serde(default = "default_sink_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_sink_queue_capacity() -> usize {
    100
}

/// Sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// File output (json or csv, see `params.format`)
    File,
}
