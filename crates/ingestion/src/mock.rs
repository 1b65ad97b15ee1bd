//! Mock reading source
//!
//! Seeded synthetic traffic for demos and tests, no input file required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{MockInputConfig, PipelineError, Reading, ReadingSource, SensorId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

struct MockState {
    sample: u32,
    sensor: u32,
    rng: StdRng,
}

/// In-memory reading source generating the same record shape as the
/// dataset generator: for each sample interval, one reading per sensor,
/// vehicle counts drawn uniformly below `max_vehicles`.
///
/// Fixed seed means fixed traffic, so test runs are reproducible.
pub struct MockReadingSource {
    config: MockInputConfig,
    state: Mutex<MockState>,
    exhausted: AtomicBool,
}

impl MockReadingSource {
    /// Create a source over the given synthetic traffic parameters.
    pub fn new(config: MockInputConfig) -> Self {
        debug!(
            sensors = config.sensors,
            samples = config.samples,
            seed = config.seed,
            "mock reading source created"
        );
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            state: Mutex::new(MockState {
                sample: 0,
                sensor: 0,
                rng,
            }),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Total records this source will deliver.
    pub fn record_count(&self) -> u64 {
        self.config.record_count()
    }

    fn lock_state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReadingSource for MockReadingSource {
    fn next_reading(&self) -> Result<Option<Reading>, PipelineError> {
        let mut state = self.lock_state();

        if self.config.sensors == 0 || state.sample >= self.config.samples {
            self.exhausted.store(true, Ordering::Release);
            return Ok(None);
        }

        let timestamp = self
            .config
            .start_timestamp
            .wrapping_add(i64::from(state.sample) * self.config.interval_secs);
        let vehicle_count = if self.config.max_vehicles == 0 {
            0
        } else {
            state.rng.random_range(0..self.config.max_vehicles)
        };

        let reading = Reading {
            sensor_id: SensorId::new(state.sensor),
            timestamp,
            vehicle_count,
        };

        state.sensor += 1;
        if state.sensor >= self.config.sensors {
            state.sensor = 0;
            state.sample += 1;
        }

        Ok(Some(reading))
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }
}
