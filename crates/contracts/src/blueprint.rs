//! AnimationBlueprint - Config Loader output
//!
//! Describes a complete animation session: timeline, synchronizer options,
//! time-indexed layers, and output routing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{SyncOptions, TimeRange, TimeSyncError, TimeUnit};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete animation session blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Timeline cadence and window
    pub timeline: TimelineConfig,

    /// Synchronizer options
    #[serde(default)]
    pub sync: SyncOptions,

    /// Managed layer definitions
    pub layers: Vec<LayerConfig>,

    /// Output routing configuration
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Timeline configuration: window, step, and pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Window start (inclusive, UTC)
    pub start: DateTime<Utc>,

    /// Window end (inclusive, UTC)
    pub end: DateTime<Utc>,

    /// Signed step per tick, in `unit`s; negative plays backwards
    #[serde(default = "default_step")]
    pub step: i64,

    /// Step granularity
    #[serde(default = "default_timeline_unit")]
    pub unit: TimeUnit,

    /// Wall-clock pacing between ticks, in milliseconds (0 = as fast as the
    /// layers allow)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (None = run the whole window)
    #[serde(default)]
    pub max_ticks: Option<u64>,

    /// Deadline for per-tick layer reloads, in milliseconds
    #[serde(default = "default_stall_timeout_ms")]
    pub stall_timeout_ms: u64,
}

fn default_step() -> i64 {
    1
}

fn default_timeline_unit() -> TimeUnit {
    TimeUnit::Days
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_stall_timeout_ms() -> u64 {
    10_000
}

/// Time-indexed layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Unique identifier
    pub id: String,

    /// Human-readable title (optional)
    #[serde(default)]
    pub title: Option<String>,

    /// Initial visibility
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Whether the layer accepts interval time parameters
    #[serde(default = "default_allow_range")]
    pub allow_range: bool,

    /// Discrete valid time instants, strictly ascending; empty = continuous
    #[serde(default)]
    pub time_instants: Vec<DateTime<Utc>>,

    /// Simulated reload latency in milliseconds (mock runtime)
    #[serde(default = "default_reload_ms")]
    pub reload_ms: u64,

    /// Additional random reload latency bound in milliseconds
    #[serde(default)]
    pub reload_jitter_ms: u64,

    /// Fraction of reloads that fail (load-end still fires), `0.0..=1.0`
    #[serde(default)]
    pub fail_rate: f64,
}

fn default_visible() -> bool {
    true
}

fn default_allow_range() -> bool {
    true
}

fn default_reload_ms() -> u64 {
    50
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON-lines file output
    File,
}

impl AnimationBlueprint {
    /// Build the agent's time window from the timeline bounds.
    pub fn time_range(&self) -> Result<TimeRange, TimeSyncError> {
        TimeRange::new(self.timeline.start, self.timeline.end)
    }

    /// Synchronizer options with the timeline's unit applied.
    ///
    /// The blueprint `sync` table may omit `unit`; the timeline's step
    /// granularity is the authoritative one.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            unit: self.timeline.unit,
            ..self.sync.clone()
        }
    }

    /// Look up a layer definition by id.
    pub fn find_layer(&self, layer_id: &str) -> Option<&LayerConfig> {
        self.layers.iter().find(|layer| layer.id == layer_id)
    }
}
