//! TickRecord - per-tick resolution report
//!
//! Serializable record of what one tick did to each managed layer. Produced
//! from `TickOutcome`, consumed by the dispatcher sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::LayerId;

/// One layer's applied time parameter for a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTime {
    /// Target layer
    pub layer_id: LayerId,

    /// Outgoing ISO-8601 `TIME` parameter value
    pub param: String,

    /// Whether the parameter change actually started a reload
    pub reloading: bool,
}

/// One layer skipped by a tick, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLayer {
    /// Skipped layer
    pub layer_id: LayerId,

    /// Why no time parameter was applied
    pub reason: SkipReason,
}

/// Why a layer received no time parameter on a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No valid instant at or before the tick time (`last_valid` underflow);
    /// the layer was hidden instead of receiving a bogus time
    NoValidTime,

    /// Time resolution failed; the layer was hidden and the error recorded
    ResolveFailed(String),
}

/// Per-tick resolution record dispatched to sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRecord {
    /// Tick sequence number (monotonically increasing)
    pub sequence: u64,

    /// Tick generation; reload requests from this tick carry the same id
    pub request: u64,

    /// The tick's animation instant
    pub tick_time: DateTime<Utc>,

    /// Whether the tick fell inside the active window
    pub in_range: bool,

    /// Visible-layer count snapshot taken at tick start
    pub pending_at_start: usize,

    /// Layers that received a time parameter
    pub applied: Vec<AppliedTime>,

    /// Layers skipped (hidden) with reasons
    pub skipped: Vec<SkippedLayer>,
}

impl TickRecord {
    /// Number of layers whose parameter change started a reload.
    pub fn reload_count(&self) -> usize {
        self.applied.iter().filter(|a| a.reloading).count()
    }
}
