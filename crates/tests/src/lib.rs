//! # Integration Tests
//!
//! End-to-end and property tests over the whole pipeline.
//!
//! Covers:
//! - Conservation of counts across worker topologies and queue sizes
//! - Exact apply counts (no loss, no duplication)
//! - Termination with finite and empty inputs
//! - The full mock source -> runner -> dispatcher data flow

#[cfg(test)]
mod property_tests {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use agg_engine::{CancelToken, PipelineRunner, RunOutcome, RunnerConfig};
    use contracts::{HourKey, MockInputConfig, SensorId, SensorTotal};
    use ingestion::{write_csv, CsvReadingSource};

    fn dataset() -> Vec<u8> {
        // Deterministic multi-hour dataset: 5 sensors, 60 samples at
        // 10-minute intervals spanning 10 hours
        let config = MockInputConfig {
            sensors: 5,
            samples: 60,
            interval_secs: 600,
            max_vehicles: 40,
            seed: 99,
            start_timestamp: 1_609_459_200,
        };
        let mut buf = Vec::new();
        write_csv(&mut buf, &config).unwrap();
        buf
    }

    /// Reference totals computed sequentially from the raw CSV text.
    fn reference_totals(csv: &[u8]) -> HashMap<(SensorId, HourKey), u64> {
        let mut totals = HashMap::new();
        for line in std::str::from_utf8(csv).unwrap().lines() {
            let mut fields = line.split(',');
            let sensor = SensorId::new(fields.next().unwrap().parse().unwrap());
            let timestamp: i64 = fields.next().unwrap().parse().unwrap();
            let count: u64 = fields.next().unwrap().parse().unwrap();
            let key = HourKey::from_timestamp(timestamp).unwrap();
            *totals.entry((sensor, key)).or_insert(0) += count;
        }
        totals
    }

    fn run_over(csv: Vec<u8>, producers: usize, consumers: usize, capacity: usize) -> RunOutcome {
        let source = Arc::new(CsvReadingSource::from_reader(Cursor::new(csv)));
        let runner = PipelineRunner::new(RunnerConfig {
            producers,
            consumers,
            queue_capacity: capacity,
            top_n: 3,
        });
        runner.run(source, CancelToken::new()).unwrap()
    }

    fn outcome_totals(outcome: &RunOutcome) -> HashMap<(SensorId, HourKey), u64> {
        outcome
            .buckets
            .iter()
            .flat_map(|bucket| {
                bucket
                    .totals
                    .iter()
                    .map(move |t| ((t.sensor_id, bucket.key), t.total))
            })
            .collect()
    }

    #[test]
    fn test_conservation_across_worker_counts() {
        let csv = dataset();
        let expected = reference_totals(&csv);

        for (producers, consumers, capacity) in
            [(1, 1, 1000), (2, 2, 16), (8, 8, 1), (1, 8, 100), (8, 1, 100)]
        {
            let outcome = run_over(csv.clone(), producers, consumers, capacity);
            assert_eq!(
                outcome_totals(&outcome),
                expected,
                "totals diverged with P={producers} M={consumers} C={capacity}"
            );
        }
    }

    #[test]
    fn test_exact_apply_counts() {
        for records in [0u32, 1, 10_000] {
            let config = MockInputConfig {
                sensors: if records == 0 { 1 } else { records.min(100) },
                samples: if records == 0 {
                    0
                } else {
                    records / records.min(100)
                },
                interval_secs: 60,
                max_vehicles: 10,
                seed: 5,
                start_timestamp: 1_609_459_200,
            };
            let expected = config.record_count();

            let mut csv = Vec::new();
            write_csv(&mut csv, &config).unwrap();

            let outcome = run_over(csv, 2, 2, 32);
            assert_eq!(outcome.produced, expected);
            assert_eq!(outcome.consumed, expected);
            assert_eq!(outcome.malformed, 0);
        }
    }

    #[test]
    fn test_zero_input_terminates_immediately() {
        let outcome = run_over(Vec::new(), 8, 8, 16);
        assert_eq!(outcome.produced, 0);
        assert_eq!(outcome.consumed, 0);
        assert!(outcome.buckets.is_empty());
    }

    #[test]
    fn test_concrete_scenario() {
        // capacity = 2, one hour H, readings (1, 5), (2, 9), (1, 3), top 1
        let hour_base = 1_609_477_200; // 2021-01-01 05:00:00 UTC
        let csv = format!(
            "1,{},5\n2,{},9\n1,{},3\n",
            hour_base,
            hour_base + 60,
            hour_base + 120
        );

        let source = Arc::new(CsvReadingSource::from_reader(Cursor::new(csv)));
        let runner = PipelineRunner::new(RunnerConfig {
            producers: 1,
            consumers: 1,
            queue_capacity: 2,
            top_n: 1,
        });
        let outcome = runner.run(source, CancelToken::new()).unwrap();

        assert_eq!(outcome.buckets.len(), 1);
        let bucket = &outcome.buckets[0];
        assert_eq!(
            bucket.totals,
            vec![SensorTotal::new(1u32, 8), SensorTotal::new(2u32, 9)]
        );
        assert_eq!(bucket.top, vec![SensorTotal::new(2u32, 9)]);
    }

    #[test]
    fn test_malformed_lines_do_not_corrupt_totals() {
        let hour_base = 1_609_477_200;
        let csv = format!(
            "1,{hour_base},5\ngarbage line\n2,{hour_base},9\n1,{hour_base},not-a-count\n1,{hour_base},3\n"
        );

        let outcome = run_over(csv.into_bytes(), 2, 2, 4);

        assert_eq!(outcome.consumed, 3);
        assert_eq!(outcome.malformed, 2);
        let totals = outcome_totals(&outcome);
        let key = HourKey::from_timestamp(hour_base).unwrap();
        assert_eq!(totals[&(SensorId::new(1), key)], 8);
        assert_eq!(totals[&(SensorId::new(2), key)], 9);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use agg_engine::{CancelToken, PipelineRunner, RunnerConfig};
    use contracts::{HourReport, MockInputConfig, SinkConfig, SinkType};
    use dispatcher::create_dispatcher;
    use ingestion::MockReadingSource;
    use observability::RunAggregator;
    use tokio::sync::mpsc;

    /// End-to-end test: MockReadingSource -> PipelineRunner -> Dispatcher
    ///
    /// Verifies the complete data flow:
    /// 1. MockReadingSource generates synthetic readings
    /// 2. Worker threads aggregate them into hour buckets
    /// 3. Dispatcher fans the final HourReports out to sinks
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let mock_config = MockInputConfig {
            sensors: 6,
            samples: 48,
            interval_secs: 300,
            max_vehicles: 30,
            seed: 11,
            start_timestamp: 1_609_459_200,
        };
        let source = Arc::new(MockReadingSource::new(mock_config.clone()));
        let expected_records = source.record_count();

        // Run the worker stage on a blocking thread
        let runner = PipelineRunner::new(RunnerConfig {
            producers: 2,
            consumers: 2,
            queue_capacity: 32,
            top_n: 3,
        });
        let cancel = CancelToken::new();
        let outcome = tokio::task::spawn_blocking(move || runner.run(source, cancel))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.consumed, expected_records);
        // 48 five-minute samples span 4 hours
        assert_eq!(outcome.buckets.len(), 4);

        // Dispatch the reports to a log sink
        let (report_tx, report_rx) = mpsc::channel::<HourReport>(16);
        let sink_configs = vec![SinkConfig {
            name: "test_log".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }];

        let dispatcher = create_dispatcher(sink_configs, report_rx).unwrap();
        let metrics = dispatcher.metrics();
        assert_eq!(metrics.len(), 1);
        let dispatcher_handle = dispatcher.spawn();

        let mut aggregator = RunAggregator::new();
        for bucket in &outcome.buckets {
            let report = bucket.report();
            aggregator.update(&report);
            report_tx.send(report).await.unwrap();
        }
        drop(report_tx);

        tokio::time::timeout(std::time::Duration::from_secs(5), dispatcher_handle)
            .await
            .expect("dispatcher timed out")
            .unwrap();

        let summary = aggregator.summary();
        assert_eq!(summary.hours, 4);
        assert!(summary.busiest.is_some());
    }

    /// Rankings rendered by the dispatcher match the table contents
    #[tokio::test]
    async fn test_reports_match_buckets() {
        let source = Arc::new(MockReadingSource::new(MockInputConfig {
            sensors: 4,
            samples: 12,
            interval_secs: 300,
            max_vehicles: 20,
            seed: 3,
            start_timestamp: 1_609_459_200,
        }));

        let runner = PipelineRunner::new(RunnerConfig {
            producers: 1,
            consumers: 1,
            queue_capacity: 8,
            top_n: 2,
        });
        let cancel = CancelToken::new();
        let outcome = tokio::task::spawn_blocking(move || runner.run(source, cancel))
            .await
            .unwrap()
            .unwrap();

        for bucket in &outcome.buckets {
            let report = bucket.report();
            assert_eq!(report.key, bucket.key);
            assert_eq!(report.ranked, bucket.top);
            assert!(report.ranked.len() <= 2);
            assert_eq!(report.sensor_count, bucket.totals.len());

            // Ranking is descending
            for pair in report.ranked.windows(2) {
                assert!(pair[0].total >= pair[1].total);
            }
        }
    }

    /// Blueprint loaded from TOML drives a full run
    #[tokio::test]
    async fn test_blueprint_driven_run() {
        let toml = r#"
[input]
mode = "mock"

[input.mock]
sensors = 3
samples = 12
interval_secs = 300
max_vehicles = 25
seed = 42

[workers]
producers = 2
consumers = 2

[queue]
capacity = 8

[ranking]
top_n = 2
"#;
        let blueprint =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();

        let source = Arc::new(MockReadingSource::new(blueprint.input.mock.clone()));
        let runner = PipelineRunner::new(RunnerConfig {
            producers: blueprint.workers.producers,
            consumers: blueprint.workers.consumers,
            queue_capacity: blueprint.queue.capacity,
            top_n: blueprint.ranking.top_n,
        });

        let cancel = CancelToken::new();
        let outcome = tokio::task::spawn_blocking(move || runner.run(source, cancel))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.consumed, 36);
        assert!(outcome.buckets.iter().all(|b| b.top.len() <= 2));
    }
}
