//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use agg_engine::CancelToken;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref input) = args.input {
        info!(input = %input.display(), "Overriding input path from CLI");
        blueprint.input.path = Some(input.clone());
    }
    if let Some(producers) = args.producers {
        info!(producers, "Overriding producer count from CLI");
        blueprint.workers.producers = producers;
    }
    if let Some(consumers) = args.consumers {
        info!(consumers, "Overriding consumer count from CLI");
        blueprint.workers.consumers = consumers;
    }
    if let Some(top_n) = args.top_n {
        info!(top_n, "Overriding ranking depth from CLI");
        blueprint.ranking.top_n = top_n;
    }
    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        blueprint.queue.capacity = capacity;
    }

    info!(
        mode = ?blueprint.input.mode,
        producers = blueprint.workers.producers,
        consumers = blueprint.workers.consumers,
        capacity = blueprint.queue.capacity,
        top_n = blueprint.ranking.top_n,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let cancel = CancelToken::new();
    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        cancel: cancel.clone(),
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        readings = stats.consumed,
                        hours = stats.buckets.len(),
                        duration_secs = stats.duration.as_secs_f64(),
                        throughput = format!("{:.0}/s", stats.readings_per_sec()),
                        "Pipeline completed successfully"
                    );

                    // Print detailed statistics and the final rankings
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
            cancel.cancel();
        }
    }

    info!("Traffic Tally finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::PipelineBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Input:");
    println!("  Mode: {:?}", blueprint.input.mode);
    if let Some(ref path) = blueprint.input.path {
        println!("  Path: {}", path.display());
    }
    if blueprint.input.mode == contracts::InputMode::Mock {
        println!(
            "  Mock: {} sensors x {} samples ({} records)",
            blueprint.input.mock.sensors,
            blueprint.input.mock.samples,
            blueprint.input.mock.record_count()
        );
    }

    println!("\nWorkers:");
    println!("  Producers: {}", blueprint.workers.producers);
    println!("  Consumers: {}", blueprint.workers.consumers);

    println!("\nQueue capacity: {}", blueprint.queue.capacity);
    println!("Ranking depth: {}", blueprint.ranking.top_n);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
