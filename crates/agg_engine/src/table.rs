//! Shared aggregation table: per-hour, per-sensor totals with rankings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{HourKey, HourReport, PipelineError, Reading, SensorTotal};
use serde::Serialize;
use tracing::instrument;

/// Aggregation state for all sensors observed within one hour.
///
/// Created lazily on the first reading for that hour and never deleted.
/// `totals` keeps discovery order; `top` is always exactly the N largest
/// totals, descending, ties in favor of the earlier-discovered sensor.
#[derive(Debug, Clone, Serialize)]
pub struct HourBucket {
    /// The hour this bucket covers
    pub key: HourKey,

    /// Per-sensor running totals, in discovery order
    pub totals: Vec<SensorTotal>,

    /// Maintained top-N ranking, descending by total
    pub top: Vec<SensorTotal>,
}

impl HourBucket {
    fn new(key: HourKey) -> Self {
        Self {
            key,
            totals: Vec::new(),
            top: Vec::new(),
        }
    }

    /// Build the renderable report for this bucket.
    pub fn report(&self) -> HourReport {
        HourReport {
            key: self.key,
            sensor_count: self.totals.len(),
            total_vehicles: self.totals.iter().map(|t| t.total).sum(),
            ranked: self.top.clone(),
        }
    }
}

/// Shared mapping from hour bucket to per-sensor totals plus top-N.
///
/// All consumer workers update the table concurrently; each `apply` runs
/// as one coarse critical section, so at most one worker mutates the
/// table at a time. This is the pipeline's serialization point, kept
/// deliberately simple rather than lock-free.
///
/// Buckets are stored in first-observation order (not time order), and
/// sensors within a bucket likewise; both collections are expected to
/// stay small (tens of entries), so lookup is a linear scan.
pub struct AggregationTable {
    top_n: usize,
    buckets: Mutex<Vec<HourBucket>>,
    applied: AtomicU64,
}

impl AggregationTable {
    /// Create an empty table maintaining rankings of depth `top_n`.
    ///
    /// `top_n` of 0 is allowed and yields empty rankings.
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            buckets: Mutex::new(Vec::new()),
            applied: AtomicU64::new(0),
        }
    }

    /// Configured ranking depth.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Fold one reading into the table and refresh its bucket's ranking.
    ///
    /// # Errors
    /// `InvalidTimestamp` when the reading's timestamp cannot be mapped
    /// to an hour (per-record, skippable); `InvariantViolation` on total
    /// overflow (fatal).
    #[instrument(
        level = "trace",
        name = "aggregation_apply",
        skip(self, reading),
        fields(sensor_id = %reading.sensor_id, timestamp = reading.timestamp)
    )]
    pub fn apply(&self, reading: &Reading) -> Result<(), PipelineError> {
        let key = reading
            .hour_key()
            .ok_or(PipelineError::InvalidTimestamp {
                timestamp: reading.timestamp,
            })?;

        let mut buckets = self.lock_buckets();

        // Find hour bucket, create on first observation
        let bucket_idx = match buckets.iter().position(|b| b.key == key) {
            Some(idx) => idx,
            None => {
                buckets.push(HourBucket::new(key));
                metrics::gauge!("traffic_tally_hour_buckets").set(buckets.len() as f64);
                buckets.len() - 1
            }
        };
        let bucket = &mut buckets[bucket_idx];

        // Find sensor entry, create on first observation
        let sensor_idx = match bucket
            .totals
            .iter()
            .position(|t| t.sensor_id == reading.sensor_id)
        {
            Some(idx) => idx,
            None => {
                bucket.totals.push(SensorTotal {
                    sensor_id: reading.sensor_id,
                    total: 0,
                });
                bucket.totals.len() - 1
            }
        };

        let entry = &mut bucket.totals[sensor_idx];
        entry.total = entry
            .total
            .checked_add(u64::from(reading.vehicle_count))
            .ok_or_else(|| {
                PipelineError::invariant(format!("total overflow for sensor {}", reading.sensor_id))
            })?;

        // Recompute the ranking from scratch: copy, stable sort, truncate.
        // The stable sort over discovery-ordered totals is what gives the
        // earlier-discovered sensor the win on ties.
        let mut ranked = bucket.totals.clone();
        ranked.sort_by(|a, b| b.total.cmp(&a.total));
        ranked.truncate(self.top_n);
        bucket.top = ranked;

        drop(buckets);

        self.applied.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("traffic_tally_readings_applied_total").increment(1);
        Ok(())
    }

    /// Number of readings successfully applied.
    pub fn applied_count(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Number of hour buckets created so far.
    pub fn bucket_count(&self) -> usize {
        self.lock_buckets().len()
    }

    /// Clone all buckets in first-observation order.
    ///
    /// Intended for use after every consumer has finished; calling it
    /// mid-run yields a consistent but possibly stale view.
    pub fn snapshot(&self) -> Vec<HourBucket> {
        self.lock_buckets().clone()
    }

    fn lock_buckets(&self) -> MutexGuard<'_, Vec<HourBucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AggregationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationTable")
            .field("top_n", &self.top_n)
            .field("buckets", &self.bucket_count())
            .field("applied", &self.applied_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SensorId;

    // 2021-01-01 05:00:00 UTC
    const HOUR_BASE: i64 = 1_609_477_200;

    fn reading(sensor: u32, timestamp: i64, count: u32) -> Reading {
        Reading::new(sensor, timestamp, count)
    }

    #[test]
    fn test_apply_creates_bucket_and_sensor() {
        let table = AggregationTable::new(5);
        table.apply(&reading(1, HOUR_BASE, 4)).unwrap();

        let buckets = table.snapshot();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].totals.len(), 1);
        assert_eq!(buckets[0].totals[0].total, 4);
        assert_eq!(table.applied_count(), 1);
    }

    #[test]
    fn test_totals_accumulate() {
        let table = AggregationTable::new(5);
        table.apply(&reading(1, HOUR_BASE, 4)).unwrap();
        table.apply(&reading(1, HOUR_BASE + 60, 6)).unwrap();

        let buckets = table.snapshot();
        assert_eq!(buckets[0].totals[0].total, 10);
    }

    #[test]
    fn test_concrete_scenario() {
        // One hour, sensors 1 and 2, ranking depth 1:
        // (1, 5), (2, 9), (1, 3) => totals {1: 8, 2: 9}, top = [(2, 9)]
        let table = AggregationTable::new(1);
        table.apply(&reading(1, HOUR_BASE, 5)).unwrap();
        table.apply(&reading(2, HOUR_BASE + 30, 9)).unwrap();
        table.apply(&reading(1, HOUR_BASE + 60, 3)).unwrap();

        let buckets = table.snapshot();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].totals.len(), 2);
        assert_eq!(buckets[0].totals[0], SensorTotal::new(1u32, 8));
        assert_eq!(buckets[0].totals[1], SensorTotal::new(2u32, 9));
        assert_eq!(buckets[0].top, vec![SensorTotal::new(2u32, 9)]);
    }

    #[test]
    fn test_ranking_descending_and_truncated() {
        let table = AggregationTable::new(2);
        table.apply(&reading(1, HOUR_BASE, 10)).unwrap();
        table.apply(&reading(2, HOUR_BASE, 30)).unwrap();
        table.apply(&reading(3, HOUR_BASE, 20)).unwrap();

        let buckets = table.snapshot();
        assert_eq!(
            buckets[0].top,
            vec![SensorTotal::new(2u32, 30), SensorTotal::new(3u32, 20)]
        );
    }

    #[test]
    fn test_tie_breaks_by_discovery_order() {
        let table = AggregationTable::new(2);
        table.apply(&reading(5, HOUR_BASE, 7)).unwrap();
        table.apply(&reading(3, HOUR_BASE, 7)).unwrap();
        table.apply(&reading(8, HOUR_BASE, 7)).unwrap();

        // All tied; earlier-discovered sensors win the truncation
        let buckets = table.snapshot();
        assert_eq!(
            buckets[0].top,
            vec![SensorTotal::new(5u32, 7), SensorTotal::new(3u32, 7)]
        );
    }

    #[test]
    fn test_top_zero_is_empty() {
        let table = AggregationTable::new(0);
        table.apply(&reading(1, HOUR_BASE, 4)).unwrap();

        let buckets = table.snapshot();
        assert!(buckets[0].top.is_empty());
        assert_eq!(buckets[0].totals.len(), 1);
    }

    #[test]
    fn test_buckets_keep_first_observation_order() {
        let table = AggregationTable::new(5);
        let later_hour = HOUR_BASE + 3600;
        table.apply(&reading(1, later_hour, 1)).unwrap();
        table.apply(&reading(1, HOUR_BASE, 1)).unwrap();

        let buckets = table.snapshot();
        assert_eq!(buckets.len(), 2);
        // Insertion order, not time order
        assert_eq!(buckets[0].key.hour, 6);
        assert_eq!(buckets[1].key.hour, 5);
    }

    #[test]
    fn test_invalid_timestamp_is_per_record() {
        let table = AggregationTable::new(5);
        let err = table.apply(&reading(1, i64::MAX, 4)).unwrap_err();
        assert!(err.is_per_record());
        assert_eq!(table.applied_count(), 0);
        assert_eq!(table.bucket_count(), 0);
    }

    #[test]
    fn test_report_from_bucket() {
        let table = AggregationTable::new(1);
        table.apply(&reading(1, HOUR_BASE, 5)).unwrap();
        table.apply(&reading(2, HOUR_BASE, 9)).unwrap();

        let report = table.snapshot()[0].report();
        assert_eq!(report.sensor_count, 2);
        assert_eq!(report.total_vehicles, 14);
        assert_eq!(report.busiest().unwrap().sensor_id, SensorId::new(2));
    }
}
