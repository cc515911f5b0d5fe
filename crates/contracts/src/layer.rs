//! TimeLayer trait - Time-indexed layer abstraction
//!
//! Defines the unified interface the synchronizer drives, decoupling it from
//! concrete layer implementations. Supports unified handling of real map
//! layers and mock layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{LayerId, RequestId, TimeParam};

/// Layer event callback type
///
/// When a layer starts or finishes a reload, it notifies subscribers through
/// this callback. Uses `Arc` to allow callback sharing across contexts.
pub type LayerEventCallback = Arc<dyn Fn(LayerEvent) + Send + Sync>;

/// Handle returned by `TimeLayer::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Load lifecycle notification emitted by a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEvent {
    /// Emitting layer
    pub layer_id: LayerId,

    /// The reload request this event belongs to (echoed from `apply_time`)
    pub request: RequestId,

    /// Lifecycle phase
    pub kind: LayerEventKind,
}

/// Load lifecycle phase
///
/// `LoadEnd` fires on success and failure alike; the layer network stack does
/// not distinguish the two for gating purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerEventKind {
    LoadStart,
    LoadEnd,
}

/// Read-only per-layer metadata consumed by the synchronizer.
#[derive(Debug, Clone)]
pub struct LayerMetadata {
    /// Whether the layer accepts interval (`start/end`) time parameters
    pub allow_range: bool,

    /// Discrete valid time instants, strictly ascending; may be empty
    pub time_instants: Arc<[DateTime<Utc>]>,
}

impl Default for LayerMetadata {
    fn default() -> Self {
        Self {
            allow_range: true,
            time_instants: Arc::new([]),
        }
    }
}

impl LayerMetadata {
    /// Metadata for a layer with no discrete time index.
    pub fn continuous() -> Self {
        Self::default()
    }

    /// Metadata for a layer with a discrete time index.
    pub fn with_instants(instants: impl Into<Arc<[DateTime<Utc>]>>) -> Self {
        Self {
            allow_range: true,
            time_instants: instants.into(),
        }
    }
}

/// Time-indexed layer trait
///
/// Abstracts the common behavior of real map layers and mock layers. The
/// synchronizer only touches layers through this interface.
///
/// # Design Principles
///
/// 1. **Decoupling**: separates time resolution from layer reload mechanics
/// 2. **Unified Interface**: mock and real layers use the same API
/// 3. **Callback Pattern**: load events use callbacks instead of channels,
///    consistent with map-toolkit event buses
///
/// # Example
///
/// ```ignore
/// let layer: Arc<dyn TimeLayer> = get_layer();
/// let sub = layer.subscribe(Arc::new(|event| {
///     println!("{:?} from {}", event.kind, event.layer_id);
/// }));
/// // ... drive the layer ...
/// layer.unsubscribe(sub);
/// ```
pub trait TimeLayer: Send + Sync {
    /// Layer ID
    fn id(&self) -> &LayerId;

    /// Read-only metadata snapshot (range capability, discrete instants)
    fn metadata(&self) -> LayerMetadata;

    /// Current visibility flag
    fn is_visible(&self) -> bool;

    /// Set the visibility flag. Hiding a layer does not cancel an in-flight
    /// reload; its load-end still fires.
    fn set_visibility(&self, visible: bool);

    /// Merge the resolved time parameter into the layer's request parameters.
    ///
    /// Returns `true` iff the parameter changed and a reload was started; the
    /// layer must then emit `LoadStart`/`LoadEnd` events echoing `request`.
    fn apply_time(&self, param: &TimeParam, request: RequestId) -> bool;

    /// Register a load event callback.
    fn subscribe(&self, callback: LayerEventCallback) -> SubscriptionId;

    /// Remove a previously registered callback. Unknown ids are a no-op.
    fn unsubscribe(&self, subscription: SubscriptionId);
}
