//! Animation orchestrator - coordinates all components.
//!
//! Plays the timeline from the blueprint window across the mock layers:
//! each tick goes to the agent, the resulting record to the dispatcher,
//! and advancement waits on the agent's readiness gate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{AnimationBlueprint, TimeAgent, TimeLayer, TimeSyncError, TimeTick};
use layer_runtime::build_layers;
use observability::{record_ready_wait_ms, record_stall, record_tick_metrics};
use time_agent::{add_units, WmsTimeAgent};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::AnimationStats;

/// Animation configuration
#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// The animation blueprint
    pub blueprint: AnimationBlueprint,

    /// Maximum number of ticks to drive (None = blueprint / whole window)
    pub max_ticks: Option<u64>,

    /// Wall-clock pacing override between ticks (None = blueprint)
    pub tick_interval: Option<Duration>,

    /// Channel buffer size for the record queue
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main animation orchestrator
pub struct Animation {
    config: AnimationConfig,
}

impl Animation {
    /// Create a new animation with the given configuration
    pub fn new(config: AnimationConfig) -> Self {
        Self { config }
    }

    /// Run the animation to completion
    pub async fn run(self) -> Result<AnimationStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Build mock layers
        let layers = build_layers(blueprint);
        info!(layers = layers.len(), "Mock layers built");

        // Configure the agent
        let range = blueprint
            .time_range()
            .context("Invalid timeline window")?;
        let options = blueprint.sync_options();
        let mut agent =
            WmsTimeAgent::new(options.clone(), range).context("Failed to create time agent")?;
        for layer in &layers {
            agent
                .add_layer(Arc::clone(layer) as Arc<dyn TimeLayer>)
                .context("Failed to register layer")?;
        }

        info!(
            interval_mode = ?options.interval_mode,
            range_mode = ?options.range_mode,
            unit = %options.unit,
            "Time agent configured"
        );

        // Setup Dispatcher
        let (record_tx, record_rx) = mpsc::channel(self.config.buffer_size);

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - tick records will be dropped");
        }

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), record_rx)
            .context("Failed to create dispatcher")?;

        let active_sinks = blueprint.sinks.len();
        let dispatcher_handle = dispatcher.spawn();

        info!(active_sinks, "Dispatcher started");

        // Drive the timeline
        let mut stats = self.drive(&mut agent, record_tx).await?;
        stats.active_layers = layers.len();
        stats.active_sinks = active_sinks;

        // Shutdown
        info!("Shutting down animation...");
        agent.destroy();

        // Wait for dispatcher to flush
        let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            ticks = stats.ticks,
            stalls = stats.stalls,
            "Animation shutdown complete"
        );

        Ok(stats)
    }

    /// Tick loop: resolve, dispatch, gate, advance.
    async fn drive(
        &self,
        agent: &mut WmsTimeAgent,
        record_tx: mpsc::Sender<contracts::TickRecord>,
    ) -> Result<AnimationStats> {
        let timeline = &self.config.blueprint.timeline;
        let step = timeline.step;
        let unit = timeline.unit;
        let stall_timeout = Duration::from_millis(timeline.stall_timeout_ms);
        let tick_interval = self
            .config
            .tick_interval
            .unwrap_or(Duration::from_millis(timeline.tick_interval_ms));
        let max_ticks = self.config.max_ticks.or(timeline.max_ticks);

        // A negative step plays the window backwards from its end
        let mut current = if step >= 0 {
            timeline.start
        } else {
            timeline.end
        };

        let mut stats = AnimationStats::default();
        let mut sequence: u64 = 0;

        info!(
            start = %timeline.start,
            end = %timeline.end,
            step,
            unit = %unit,
            max_ticks = ?max_ticks,
            "Animation running"
        );

        while current >= timeline.start && current <= timeline.end {
            if let Some(max) = max_ticks {
                if sequence >= max {
                    info!(ticks = sequence, "Reached max ticks limit");
                    break;
                }
            }

            let outcome = agent
                .on_tick(&TimeTick::at(current))
                .context("Tick processing failed")?;
            let record = outcome.to_record(sequence);

            record_tick_metrics(&record);
            stats.tick_metrics.update(&record);
            stats.reloads_started += record.reload_count() as u64;
            if record.in_range {
                stats.in_range_ticks += 1;
            }

            info!(
                sequence,
                time = %record.tick_time,
                pending = record.pending_at_start,
                applied = record.applied.len(),
                skipped = record.skipped.len(),
                "Tick resolved"
            );

            if record_tx.send(record).await.is_err() {
                warn!("Dispatcher channel closed");
                break;
            }

            // Gate advancement on the agent's readiness flag
            let wait_start = Instant::now();
            match agent.wait_ready(stall_timeout).await {
                Ok(()) => {
                    let wait_ms = wait_start.elapsed().as_secs_f64() * 1000.0;
                    record_ready_wait_ms(wait_ms);
                    stats.tick_metrics.record_wait(wait_ms);
                }
                Err(TimeSyncError::ReadinessTimeout { pending, .. }) => {
                    warn!(
                        sequence,
                        pending,
                        timeout_ms = timeline.stall_timeout_ms,
                        "Layers missed readiness deadline; advancing anyway"
                    );
                    record_stall(pending);
                    stats.tick_metrics.record_stall();
                    stats.stalls += 1;
                }
                Err(e) => return Err(e).context("Readiness wait failed"),
            }

            sequence += 1;
            stats.ticks = sequence;

            current = add_units(current, step, unit).context("Timeline step overflow")?;

            if !tick_interval.is_zero() {
                tokio::time::sleep(tick_interval).await;
            }
        }

        Ok(stats)
    }
}
