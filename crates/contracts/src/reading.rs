//! Reading - ingestion input record
//!
//! One traffic-light observation plus the hour key used to group it.

use std::fmt;

use chrono::{DateTime, Datelike, Timelike};
use serde::{Deserialize, Serialize};

/// Traffic-light sensor identifier.
///
/// Sensor ids come from the input stream as small integers. The newtype
/// keeps them from being mixed up with counts or timestamps.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SensorId(u32);

impl SensorId {
    /// Create a new sensor id.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for SensorId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One sensor observation
///
/// Immutable once produced; ownership moves through the queue so exactly
/// one consumer ever holds a given reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Originating traffic light
    pub sensor_id: SensorId,

    /// Observation time, Unix epoch seconds
    pub timestamp: i64,

    /// Vehicles counted in this sample
    pub vehicle_count: u32,
}

impl Reading {
    /// Create a new reading.
    pub fn new(sensor_id: impl Into<SensorId>, timestamp: i64, vehicle_count: u32) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp,
            vehicle_count,
        }
    }

    /// The hour bucket key for this reading, if the timestamp is representable.
    #[inline]
    pub fn hour_key(&self) -> Option<HourKey> {
        HourKey::from_timestamp(self.timestamp)
    }
}

/// Aggregation grouping key: a timestamp truncated to the UTC hour.
///
/// Minutes and seconds are zeroed; equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HourKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl HourKey {
    /// Truncate Unix epoch seconds to the containing UTC hour.
    ///
    /// Returns `None` for timestamps chrono cannot represent.
    pub fn from_timestamp(timestamp: i64) -> Option<Self> {
        let dt = DateTime::from_timestamp(timestamp, 0)?;
        Some(Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
        })
    }
}

impl fmt::Display for HourKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:00",
            self.year, self.month, self.day, self.hour
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_key_truncation() {
        // 2021-01-01 05:42:17 UTC
        let key = HourKey::from_timestamp(1_609_477_337).unwrap();
        assert_eq!(key.year, 2021);
        assert_eq!(key.month, 1);
        assert_eq!(key.day, 1);
        assert_eq!(key.hour, 5);
    }

    #[test]
    fn test_same_hour_same_key() {
        let a = HourKey::from_timestamp(1_609_477_200).unwrap(); // 05:40:00
        let b = HourKey::from_timestamp(1_609_476_000).unwrap(); // 05:20:00
        let c = HourKey::from_timestamp(1_609_480_800).unwrap(); // 06:40:00
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hour_key_out_of_range() {
        assert!(HourKey::from_timestamp(i64::MAX).is_none());
        assert!(HourKey::from_timestamp(i64::MIN).is_none());
    }

    #[test]
    fn test_hour_key_display() {
        let key = HourKey::from_timestamp(1_609_477_337).unwrap();
        assert_eq!(key.to_string(), "2021-01-01 05:00");
    }

    #[test]
    fn test_reading_serde() {
        let reading = Reading::new(7u32, 1_609_477_337, 42);
        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"sensor_id\":7"));
        let parsed: Reading = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, reading);
    }
}
