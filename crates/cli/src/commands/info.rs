//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    timeline: TimelineInfo,
    layers: Vec<LayerInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    sync_settings: SyncInfo,
}

#[derive(Serialize)]
struct TimelineInfo {
    start: String,
    end: String,
    step: i64,
    unit: String,
    tick_interval_ms: u64,
}

#[derive(Serialize)]
struct LayerInfo {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    visible: bool,
    allow_range: bool,
    instant_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_instant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_instant: Option<String>,
    reload_ms: u64,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
}

#[derive(Serialize)]
struct SyncInfo {
    interval_mode: String,
    range_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range_interval: Option<i64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::AnimationBlueprint, args: &InfoArgs) -> ConfigInfo {
    let layers = blueprint
        .layers
        .iter()
        .map(|l| LayerInfo {
            id: l.id.clone(),
            title: l.title.clone(),
            visible: l.visible,
            allow_range: l.allow_range,
            instant_count: l.time_instants.len(),
            first_instant: if args.layers {
                l.time_instants.first().map(|t| t.to_rfc3339())
            } else {
                None
            },
            last_instant: if args.layers {
                l.time_instants.last().map(|t| t.to_rfc3339())
            } else {
                None
            },
            reload_ms: l.reload_ms,
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
            })
            .collect()
    } else {
        Vec::new()
    };

    let sync_settings = SyncInfo {
        interval_mode: format!("{:?}", blueprint.sync.interval_mode),
        range_mode: format!("{:?}", blueprint.sync.range_mode),
        range_interval: blueprint.sync.range_interval,
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        timeline: TimelineInfo {
            start: blueprint.timeline.start.to_rfc3339(),
            end: blueprint.timeline.end.to_rfc3339(),
            step: blueprint.timeline.step,
            unit: blueprint.timeline.unit.to_string(),
            tick_interval_ms: blueprint.timeline.tick_interval_ms,
        },
        layers,
        sinks,
        sync_settings,
    }
}

fn print_config_info(blueprint: &contracts::AnimationBlueprint, args: &InfoArgs) {
    println!("=== WMS Timesync Configuration ===\n");

    // Timeline info
    println!("Timeline");
    println!("   Version: {:?}", blueprint.version);
    println!(
        "   Window: {} .. {}",
        blueprint.timeline.start, blueprint.timeline.end
    );
    println!(
        "   Step: {} {} every {} ms",
        blueprint.timeline.step, blueprint.timeline.unit, blueprint.timeline.tick_interval_ms
    );
    match blueprint.timeline.max_ticks {
        Some(max) => println!("   Max ticks: {max}"),
        None => println!("   Max ticks: whole window"),
    }

    // Layers
    println!("\nLayers ({})", blueprint.layers.len());
    for layer in &blueprint.layers {
        let title = layer.title.as_deref().unwrap_or("-");
        println!(
            "   - {} ({}, {}, range {})",
            layer.id,
            title,
            if layer.visible { "visible" } else { "hidden" },
            if layer.allow_range {
                "allowed"
            } else {
                "disallowed"
            }
        );

        if args.layers && !layer.time_instants.is_empty() {
            println!(
                "       time index: {} instants, {} .. {}",
                layer.time_instants.len(),
                layer.time_instants[0],
                layer.time_instants[layer.time_instants.len() - 1]
            );
            println!(
                "       reload: {} ms (+{} ms jitter, fail rate {:.0}%)",
                layer.reload_ms,
                layer.reload_jitter_ms,
                layer.fail_rate * 100.0
            );
        } else if layer.time_instants.is_empty() {
            println!("       time index: continuous");
        } else {
            println!("       time index: {} instants", layer.time_instants.len());
        }
    }

    // Sync Settings
    let sync = &blueprint.sync;
    println!("\nSync Settings");
    println!("   Interval mode: {:?}", sync.interval_mode);
    println!("   Range mode: {:?}", sync.range_mode);
    match sync.range_interval {
        Some(interval) => println!("   Range interval: {interval}"),
        None => println!("   Range interval: (unset)"),
    }

    // Sinks
    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({})", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("   - {} ({:?})", sink.name, sink.sink_type);
            if args.sinks {
                for (key, value) in &sink.params {
                    println!("       {key} = {value}");
                }
            }
        }
    }

    println!();
}
