//! Pipeline metric recording and in-memory run aggregation.

use contracts::{HourKey, HourReport, SensorTotal};
use metrics::{counter, gauge, histogram};

/// Record the queue depth at a sampled instant.
pub fn record_queue_depth(depth: usize) {
    gauge!("traffic_tally_queue_depth").set(depth as f64);
}

/// Record an hour report handed to a sink.
pub fn record_report_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "traffic_tally_reports_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record end-of-run totals.
pub fn record_run_totals(produced: u64, consumed: u64, malformed: u64, duration_secs: f64) {
    counter!("traffic_tally_runs_total").increment(1);
    gauge!("traffic_tally_last_run_produced").set(produced as f64);
    gauge!("traffic_tally_last_run_consumed").set(consumed as f64);
    gauge!("traffic_tally_last_run_malformed").set(malformed as f64);
    histogram!("traffic_tally_run_duration_seconds").record(duration_secs);
}

/// Run report aggregator
///
/// Accumulates statistics over the final hour reports for the end-of-run
/// summary printed by the CLI.
#[derive(Debug, Clone, Default)]
pub struct RunAggregator {
    /// Hour buckets seen
    hours: u64,

    /// Vehicles across every hour
    total_vehicles: u64,

    /// Busiest (hour, sensor) seen so far
    busiest: Option<(HourKey, SensorTotal)>,

    /// Vehicles-per-hour statistics
    vehicle_stats: RunningStats,

    /// Distinct-sensors-per-hour statistics
    sensor_stats: RunningStats,
}

impl RunAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one hour report into the running statistics
    pub fn update(&mut self, report: &HourReport) {
        self.hours += 1;
        self.total_vehicles += report.total_vehicles;
        self.vehicle_stats.record(report.total_vehicles as f64);
        self.sensor_stats.record(report.sensor_count as f64);

        if let Some(leader) = report.busiest() {
            let replace = match &self.busiest {
                Some((_, current)) => leader.total > current.total,
                None => true,
            };
            if replace {
                self.busiest = Some((report.key, *leader));
            }
        }
    }

    /// Produce the summary report
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            hours: self.hours,
            total_vehicles: self.total_vehicles,
            busiest: self.busiest,
            vehicles_per_hour: StatsSummary::from(&self.vehicle_stats),
            sensors_per_hour: StatsSummary::from(&self.sensor_stats),
        }
    }
}

/// Aggregated run summary
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub hours: u64,
    pub total_vehicles: u64,
    pub busiest: Option<(HourKey, SensorTotal)>,
    pub vehicles_per_hour: StatsSummary,
    pub sensors_per_hour: StatsSummary,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Hours observed: {}", self.hours)?;
        writeln!(f, "Total vehicles: {}", self.total_vehicles)?;
        if let Some((hour, leader)) = &self.busiest {
            writeln!(
                f,
                "Busiest: sensor {} at {} ({} cars)",
                leader.sensor_id, hour, leader.total
            )?;
        }
        writeln!(f, "Vehicles per hour: {}", self.vehicles_per_hour)?;
        writeln!(f, "Sensors per hour: {}", self.sensors_per_hour)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Fold in a new value
    pub fn record(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean value
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum value
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum value
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SensorId;

    fn report(hour_ts: i64, entries: &[(u32, u64)]) -> HourReport {
        let ranked: Vec<SensorTotal> = entries
            .iter()
            .map(|&(id, total)| SensorTotal::new(id, total))
            .collect();
        HourReport {
            key: HourKey::from_timestamp(hour_ts).unwrap(),
            sensor_count: ranked.len(),
            total_vehicles: ranked.iter().map(|t| t.total).sum(),
            ranked,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.record(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_tracks_busiest() {
        let mut aggregator = RunAggregator::new();
        aggregator.update(&report(1_609_477_200, &[(1, 40), (2, 30)]));
        aggregator.update(&report(1_609_480_800, &[(3, 90), (1, 10)]));

        let summary = aggregator.summary();
        assert_eq!(summary.hours, 2);
        assert_eq!(summary.total_vehicles, 170);

        let (hour, leader) = summary.busiest.unwrap();
        assert_eq!(leader.sensor_id, SensorId::new(3));
        assert_eq!(leader.total, 90);
        assert_eq!(hour.hour, 6);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RunAggregator::new();
        aggregator.update(&report(1_609_477_200, &[(1, 40)]));

        let output = aggregator.summary().to_string();
        assert!(output.contains("Hours observed: 1"));
        assert!(output.contains("Total vehicles: 40"));
        assert!(output.contains("sensor 1"));
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = RunAggregator::new().summary();
        let output = summary.to_string();
        assert!(output.contains("Hours observed: 0"));
        assert!(output.contains("N/A"));
    }
}
