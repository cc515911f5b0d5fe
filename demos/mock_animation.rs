//! Mock Animation Example
//!
//! Demonstrates driving mock WMS layers through a time window with the
//! WmsTimeAgent. Runs without a map-rendering host.
//!
//! Run with: cargo run --bin mock_animation

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use config_loader::ConfigLoader;
use contracts::{
    AnimationBlueprint, ConfigVersion, IntervalMode, LayerConfig, SinkConfig, SinkType,
    SyncOptions, TimeAgent, TimeLayer, TimeTick, TimelineConfig, TimeUnit,
};
use dispatcher::create_dispatcher;
use layer_runtime::build_layers;
use time_agent::{add_units, WmsTimeAgent};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Animation Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // Create a minimal test blueprint
        create_test_blueprint()
    };

    // ==== Stage 2: Build mock layers ====
    tracing::info!("Building mock layers...");
    let layers = build_layers(&blueprint);
    tracing::info!(layers = layers.len(), "Mock layers built");

    // ==== Stage 3: Configure the time agent ====
    let range = blueprint.time_range()?;
    let options = blueprint.sync_options();
    let mut agent = WmsTimeAgent::new(options, range)?;
    for layer in &layers {
        agent.add_layer(Arc::clone(layer) as Arc<dyn TimeLayer>)?;
    }
    tracing::info!("Time agent configured");

    // ==== Stage 4: Setup dispatcher ====
    let (record_tx, record_rx) = mpsc::channel(100);
    let dispatcher = create_dispatcher(blueprint.sinks.clone(), record_rx)?;
    let dispatcher_handle = dispatcher.spawn();

    // ==== Stage 5: Drive the timeline ====
    let timeline = &blueprint.timeline;
    let mut current = timeline.start;
    let mut sequence = 0u64;
    let mut aggregator = observability::TickMetricsAggregator::new();

    while current <= timeline.end {
        let outcome = agent.on_tick(&TimeTick::at(current))?;
        let record = outcome.to_record(sequence);
        aggregator.update(&record);

        tracing::info!(
            sequence,
            time = %record.tick_time,
            applied = record.applied.len(),
            reloading = record.reload_count(),
            "Tick resolved"
        );

        record_tx.send(record).await?;
        agent.wait_ready(Duration::from_secs(5)).await?;

        sequence += 1;
        current = add_units(current, timeline.step, timeline.unit)?;
    }

    // ==== Stage 6: Shutdown and report ====
    agent.destroy();
    drop(record_tx);
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

    for layer in &layers {
        tracing::info!(
            layer = %layer.id(),
            reloads = layer.reload_count(),
            failures = layer.failure_count(),
            "Layer totals"
        );
    }
    println!("{}", aggregator.summary());

    tracing::info!("Mock animation finished");
    Ok(())
}

/// Minimal in-code blueprint: two indexed layers, one continuous, log sink.
fn create_test_blueprint() -> AnimationBlueprint {
    let day = |d: u32| Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap();

    AnimationBlueprint {
        version: ConfigVersion::V1,
        timeline: TimelineConfig {
            start: day(1),
            end: day(10),
            step: 1,
            unit: TimeUnit::Days,
            tick_interval_ms: 0,
            max_ticks: None,
            stall_timeout_ms: 5_000,
        },
        sync: SyncOptions {
            interval_mode: IntervalMode::Nearest,
            ..Default::default()
        },
        layers: vec![
            LayerConfig {
                id: "radar_composite".into(),
                title: Some("Radar composite".into()),
                visible: true,
                allow_range: true,
                time_instants: vec![day(1), day(3), day(5), day(7), day(9)],
                reload_ms: 20,
                reload_jitter_ms: 10,
                fail_rate: 0.0,
            },
            LayerConfig {
                id: "satellite_ir".into(),
                title: Some("Satellite infrared".into()),
                visible: true,
                allow_range: false,
                time_instants: vec![day(2), day(4), day(6), day(8)],
                reload_ms: 35,
                reload_jitter_ms: 0,
                fail_rate: 0.1,
            },
            LayerConfig {
                id: "surface_analysis".into(),
                title: Some("Surface analysis".into()),
                visible: true,
                allow_range: true,
                time_instants: vec![],
                reload_ms: 10,
                reload_jitter_ms: 0,
                fail_rate: 0.0,
            },
        ],
        sinks: vec![SinkConfig {
            name: "demo_log".into(),
            sink_type: SinkType::Log,
            queue_capacity: 100,
            params: Default::default(),
        }],
    }
}
