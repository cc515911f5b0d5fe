//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Animation, AnimationConfig};

/// Execute the `run` command
pub async fn run_animation(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        start = %blueprint.timeline.start,
        end = %blueprint.timeline.end,
        step = blueprint.timeline.step,
        unit = %blueprint.timeline.unit,
        layers = blueprint.layers.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build animation configuration
    let animation_config = AnimationConfig {
        blueprint,
        max_ticks: if args.max_ticks == 0 {
            None
        } else {
            Some(args.max_ticks)
        },
        tick_interval: args.tick_interval_ms.map(Duration::from_millis),
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run animation
    let animation = Animation::new(animation_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting animation...");

    // Run animation with shutdown signal
    tokio::select! {
        result = animation.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        ticks = stats.ticks,
                        stalls = stats.stalls,
                        duration_secs = stats.duration.as_secs_f64(),
                        ticks_per_sec = format!("{:.2}", stats.ticks_per_second()),
                        "Animation completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Animation execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping animation...");
        }
    }

    info!("WMS Timesync finished");
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
fn print_config_summary(blueprint: &contracts::AnimationBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Timeline:");
    println!(
        "  Window: {} .. {}",
        blueprint.timeline.start, blueprint.timeline.end
    );
    println!(
        "  Step: {} {}",
        blueprint.timeline.step, blueprint.timeline.unit
    );

    println!("\nLayers ({}):", blueprint.layers.len());
    for layer in &blueprint.layers {
        let index_desc = if layer.time_instants.is_empty() {
            "continuous".to_string()
        } else {
            format!("{} instants", layer.time_instants.len())
        };
        println!(
            "  - {} ({}, {})",
            layer.id,
            index_desc,
            if layer.visible { "visible" } else { "hidden" }
        );
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!("\nSync Settings:");
    println!("  Interval mode: {:?}", blueprint.sync.interval_mode);
    println!("  Range mode: {:?}", blueprint.sync.range_mode);
    if let Some(interval) = blueprint.sync.range_interval {
        println!("  Range interval: {interval}");
    }

    println!();
}
