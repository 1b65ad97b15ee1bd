//! Configuration validation module
//!
//! Validation rules:
//! - producers >= 1, consumers >= 1
//! - queue capacity >= 1
//! - csv mode requires a non-empty path
//! - mock mode requires sensors >= 1, max_vehicles >= 1, interval >= 1
//! - sink names unique and non-empty
//! - file sink format (when given) is json or csv

use std::collections::HashSet;

use contracts::{InputMode, PipelineBlueprint, PipelineError, SinkType};

/// Validate a PipelineBlueprint
///
/// Returns the first encountered error, or Ok(()).
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    validate_workers(blueprint)?;
    validate_queue(blueprint)?;
    validate_input(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Validate worker topology
fn validate_workers(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    if blueprint.workers.producers == 0 {
        return Err(PipelineError::config_validation(
            "workers.producers",
            "must be at least 1",
        ));
    }
    if blueprint.workers.consumers == 0 {
        return Err(PipelineError::config_validation(
            "workers.consumers",
            "must be at least 1",
        ));
    }
    Ok(())
}

/// Validate queue sizing
fn validate_queue(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    if blueprint.queue.capacity == 0 {
        return Err(PipelineError::config_validation(
            "queue.capacity",
            "must be at least 1",
        ));
    }
    Ok(())
}

/// Validate input source settings
fn validate_input(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    match blueprint.input.mode {
        InputMode::Csv => {
            let has_path = blueprint
                .input
                .path
                .as_ref()
                .is_some_and(|p| !p.as_os_str().is_empty());
            if !has_path {
                return Err(PipelineError::config_validation(
                    "input.path",
                    "csv mode requires a non-empty path",
                ));
            }
        }
        InputMode::Mock => {
            let mock = &blueprint.input.mock;
            if mock.sensors == 0 {
                return Err(PipelineError::config_validation(
                    "input.mock.sensors",
                    "must be at least 1",
                ));
            }
            if mock.max_vehicles == 0 {
                return Err(PipelineError::config_validation(
                    "input.mock.max_vehicles",
                    "must be at least 1",
                ));
            }
            if mock.interval_secs <= 0 {
                return Err(PipelineError::config_validation(
                    "input.mock.interval_secs",
                    format!("must be positive, got {}", mock.interval_secs),
                ));
            }
        }
    }
    Ok(())
}

/// Validate sink configuration
fn validate_sinks(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(PipelineError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(&sink.name) {
            return Err(PipelineError::config_validation(
                format!("sinks[{idx}].name"),
                "duplicate sink name",
            ));
        }
        if sink.sink_type == SinkType::File {
            if let Some(format) = sink.params.get("format") {
                if format != "json" && format != "csv" {
                    return Err(PipelineError::config_validation(
                        format!("sinks[{idx}].params.format"),
                        format!("expected 'json' or 'csv', got '{format}'"),
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, InputConfig, MockInputConfig, QueueConfig, RankingConfig, SinkConfig,
        WorkerConfig,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn minimal_blueprint() -> PipelineBlueprint {
        PipelineBlueprint {
            version: ConfigVersion::V1,
            input: InputConfig {
                mode: InputMode::Csv,
                path: Some(PathBuf::from("trafficData.csv")),
                mock: MockInputConfig::default(),
            },
            workers: WorkerConfig {
                producers: 2,
                consumers: 2,
            },
            queue: QueueConfig { capacity: 100 },
            ranking: RankingConfig { top_n: 5 },
            sinks: vec![SinkConfig {
                name: "log".into(),
                sink_type: SinkType::Log,
                queue_capacity: 100,
                params: HashMap::new(),
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_zero_producers() {
        let mut bp = minimal_blueprint();
        bp.workers.producers = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("workers.producers"), "got: {err}");
    }

    #[test]
    fn test_zero_capacity() {
        let mut bp = minimal_blueprint();
        bp.queue.capacity = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("queue.capacity"), "got: {err}");
    }

    #[test]
    fn test_top_zero_is_allowed() {
        let mut bp = minimal_blueprint();
        bp.ranking.top_n = 0;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_csv_requires_path() {
        let mut bp = minimal_blueprint();
        bp.input.path = None;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("input.path"), "got: {err}");
    }

    #[test]
    fn test_mock_requires_sensors() {
        let mut bp = minimal_blueprint();
        bp.input.mode = InputMode::Mock;
        bp.input.mock.sensors = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("input.mock.sensors"), "got: {err}");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks.push(bp.sinks[0].clone());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].name = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_bad_file_format() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].sink_type = SinkType::File;
        bp.sinks[0]
            .params
            .insert("format".to_string(), "xml".to_string());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("format"), "got: {err}");
    }
}
