//! `info` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InfoArgs;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        println!("{}", config_loader::ConfigLoader::to_json(&blueprint)?);
        return Ok(());
    }

    println!("\n=== Pipeline Configuration ===\n");
    println!("Input mode: {:?}", blueprint.input.mode);
    if let Some(ref path) = blueprint.input.path {
        println!("Input path: {}", path.display());
    }
    println!(
        "Workers: {} producers / {} consumers",
        blueprint.workers.producers, blueprint.workers.consumers
    );
    println!("Queue capacity: {}", blueprint.queue.capacity);
    println!("Ranking depth: {}", blueprint.ranking.top_n);

    if args.sinks {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!(
                "  - {} ({:?}, queue {})",
                sink.name, sink.sink_type, sink.queue_capacity
            );
            for (key, value) in &sink.params {
                println!("      {key} = {value}");
            }
        }
    } else {
        println!("Sinks: {}", blueprint.sinks.len());
    }

    println!();
    Ok(())
}
