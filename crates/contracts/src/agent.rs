//! TimeAgent trait - Synchronizer strategy interface
//!
//! The timeline driver only drives synchronizers through this interface; the
//! WMS variant is one strategy implementing it. Composition replaces the
//! inheritance chain map toolkits traditionally use here.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    AppliedTime, LayerId, RequestId, SkippedLayer, TickRecord, TimeLayer, TimeRange,
    TimeSyncError, TimeTick,
};

/// What one tick did, returned by `on_tick`.
///
/// The driver forwards this to the dispatcher as a `TickRecord`; tests use it
/// to check the resolution decisions directly.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// Tick generation assigned to this tick's reload requests
    pub request: RequestId,

    /// The tick's animation instant
    pub current_time: DateTime<Utc>,

    /// Whether the tick fell inside the active window
    pub in_range: bool,

    /// Visible-layer count snapshot taken before applying (0 when out of range)
    pub pending_at_start: usize,

    /// Layers that received a time parameter
    pub applied: Vec<AppliedTime>,

    /// Layers skipped (hidden) with reasons
    pub skipped: Vec<SkippedLayer>,
}

impl TickOutcome {
    /// Turn this outcome into a dispatchable record.
    pub fn to_record(&self, sequence: u64) -> TickRecord {
        TickRecord {
            sequence,
            request: self.request.0,
            tick_time: self.current_time,
            in_range: self.in_range,
            pending_at_start: self.pending_at_start,
            applied: self.applied.clone(),
            skipped: self.skipped.clone(),
        }
    }
}

/// Synchronizer strategy trait
///
/// Lifecycle: layers may be added/removed at any time; `destroy` unsubscribes
/// everything and is idempotent. After `destroy`, `on_tick` returns
/// `AgentDestroyed`.
#[trait_variant::make(TimeAgent: Send)]
pub trait LocalTimeAgent {
    /// Append `layer` to the managed collection and subscribe to its load
    /// events. Future ticks include this layer.
    ///
    /// # Errors
    /// `LayerAlreadyManaged` if a layer with the same id is present.
    fn add_layer(&mut self, layer: Arc<dyn TimeLayer>) -> Result<(), TimeSyncError>;

    /// Unsubscribe and remove the layer with the given id.
    ///
    /// # Errors
    /// `LayerNotManaged` if no such layer is managed.
    fn remove_layer(&mut self, layer_id: &LayerId) -> Result<(), TimeSyncError>;

    /// Replace the active time window.
    fn set_range(&mut self, range: TimeRange);

    /// Process one tick: resolve and apply a time parameter per layer when in
    /// range, hide every layer when out of range.
    fn on_tick(&mut self, tick: &TimeTick) -> Result<TickOutcome, TimeSyncError>;

    /// Layers whose reload from the current tick has not completed.
    fn pending_loads(&self) -> usize;

    /// Readiness flag: true iff no reloads are pending. Drains any queued
    /// load events before answering.
    fn can_advance(&mut self) -> bool;

    /// Wait until every pending reload completes or `timeout` elapses.
    ///
    /// # Errors
    /// `ReadinessTimeout` with the number of still-pending layers.
    async fn wait_ready(&mut self, timeout: Duration) -> Result<(), TimeSyncError>;

    /// Unsubscribe all listeners and release the layer collection.
    /// Idempotent: calling twice is a no-op.
    fn destroy(&mut self);
}
