//! HourReport - aggregation output
//!
//! Renderable per-hour ranking handed to the dispatcher once the
//! pipeline has drained.

use serde::{Deserialize, Serialize};

use crate::{HourKey, SensorId};

/// Accumulated vehicle count for one sensor within one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorTotal {
    /// Traffic light id
    pub sensor_id: SensorId,

    /// Vehicles accumulated so far; only ever increases within a run
    pub total: u64,
}

impl SensorTotal {
    /// Create a new sensor total.
    pub fn new(sensor_id: impl Into<SensorId>, total: u64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            total,
        }
    }
}

/// Final report for one hour bucket
///
/// `ranked` is the top-N busiest sensors, descending by total, ties in
/// favor of the sensor discovered earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourReport {
    /// The hour this report covers
    pub key: HourKey,

    /// Distinct sensors observed in this hour
    pub sensor_count: usize,

    /// Vehicles across all sensors in this hour
    pub total_vehicles: u64,

    /// Top-N ranking, descending by total
    pub ranked: Vec<SensorTotal>,
}

impl HourReport {
    /// The busiest sensor of the hour, if the ranking is non-empty.
    pub fn busiest(&self) -> Option<&SensorTotal> {
        self.ranked.first()
    }
}
