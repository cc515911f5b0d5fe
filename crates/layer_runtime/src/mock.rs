//! Mock time-indexed layer
//!
//! Implements the `TimeLayer` trait with simulated asynchronous reloads.
//! Used for testing and development without a map-rendering host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{
    AnimationBlueprint, LayerConfig, LayerEvent, LayerEventCallback, LayerEventKind, LayerId,
    LayerMetadata, RequestId, SubscriptionId, TimeLayer, TimeParam,
};
use tracing::{debug, trace, warn};

use crate::params::WmsParams;

/// Mock WMS layer
///
/// Holds a `GetMap` parameter set; `apply_time` merges the resolved `time`
/// parameter and, when the value changed and the layer is visible, simulates
/// a reload on a tokio task: `LoadStart` fires immediately, `LoadEnd` after
/// the configured latency, on success and simulated failure alike. Events
/// echo the `RequestId` given to `apply_time`.
///
/// Hidden layers merge parameters without reloading, matching map-toolkit
/// behavior where invisible layers issue no requests.
pub struct MockWmsLayer {
    id: LayerId,
    metadata: LayerMetadata,
    visible: AtomicBool,
    params: Mutex<WmsParams>,
    reload_ms: u64,
    reload_jitter_ms: u64,
    fail_rate: f64,
    subscribers: Arc<Mutex<HashMap<u64, LayerEventCallback>>>,
    next_subscription: AtomicU64,
    /// xorshift state for jitter/failure simulation
    rng_state: AtomicU64,
    reload_count: AtomicU64,
    failure_count: AtomicU64,
}

impl MockWmsLayer {
    /// Start building a mock layer with the given id.
    pub fn builder(id: &str) -> MockWmsLayerBuilder {
        MockWmsLayerBuilder {
            id: id.into(),
            allow_range: true,
            time_instants: Vec::new(),
            visible: true,
            reload_ms: 50,
            reload_jitter_ms: 0,
            fail_rate: 0.0,
        }
    }

    /// Build a mock layer from a blueprint layer definition.
    pub fn from_config(config: &LayerConfig) -> Arc<Self> {
        MockWmsLayerBuilder {
            id: config.id.as_str().into(),
            allow_range: config.allow_range,
            time_instants: config.time_instants.clone(),
            visible: config.visible,
            reload_ms: config.reload_ms,
            reload_jitter_ms: config.reload_jitter_ms,
            fail_rate: config.fail_rate,
        }
        .build()
    }

    /// Total simulated reloads started.
    pub fn reload_count(&self) -> u64 {
        self.reload_count.load(Ordering::Relaxed)
    }

    /// Total simulated reload failures.
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Snapshot of the current request parameters.
    pub fn params(&self) -> WmsParams {
        self.params.lock().unwrap().clone()
    }

    /// Next pseudo-random value in [0, 1). xorshift64; deterministic per
    /// layer, good enough for latency jitter and failure sampling.
    fn next_random(&self) -> f64 {
        let mut x = self.rng_state.load(Ordering::Relaxed);
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state.store(x, Ordering::Relaxed);
        (x >> 11) as f64 / (1u64 << 53) as f64
    }

    fn notify(subscribers: &Mutex<HashMap<u64, LayerEventCallback>>, event: LayerEvent) {
        let subscribers = subscribers.lock().unwrap();
        for callback in subscribers.values() {
            callback(event.clone());
        }
    }

    /// Simulate the asynchronous request cycle for one reload.
    fn start_reload(&self, request: RequestId) {
        self.reload_count.fetch_add(1, Ordering::Relaxed);

        let jitter = if self.reload_jitter_ms > 0 {
            (self.next_random() * self.reload_jitter_ms as f64) as u64
        } else {
            0
        };
        let latency = Duration::from_millis(self.reload_ms + jitter);
        let failed = self.fail_rate > 0.0 && self.next_random() < self.fail_rate;
        if failed {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }

        Self::notify(
            &self.subscribers,
            LayerEvent {
                layer_id: self.id.clone(),
                request,
                kind: LayerEventKind::LoadStart,
            },
        );

        let id = self.id.clone();
        let subscribers = Arc::clone(&self.subscribers);
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            if failed {
                warn!(layer = %id, request = %request, "simulated reload failure");
            } else {
                trace!(layer = %id, request = %request, "simulated reload complete");
            }
            // Load end fires on success and failure alike
            Self::notify(
                &subscribers,
                LayerEvent {
                    layer_id: id,
                    request,
                    kind: LayerEventKind::LoadEnd,
                },
            );
        });
    }
}

impl TimeLayer for MockWmsLayer {
    fn id(&self) -> &LayerId {
        &self.id
    }

    fn metadata(&self) -> LayerMetadata {
        self.metadata.clone()
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_visibility(&self, visible: bool) {
        let was = self.visible.swap(visible, Ordering::SeqCst);
        if was != visible {
            debug!(layer = %self.id, visible, "visibility changed");
        }
    }

    fn apply_time(&self, param: &TimeParam, request: RequestId) -> bool {
        let changed = self
            .params
            .lock()
            .unwrap()
            .merge_new_params([("time", param.to_iso8601())]);

        if !changed {
            trace!(layer = %self.id, "time parameter unchanged; no reload");
            return false;
        }
        if !self.is_visible() {
            trace!(layer = %self.id, "hidden layer; parameter merged without reload");
            return false;
        }

        self.start_reload(request);
        true
    }

    fn subscribe(&self, callback: LayerEventCallback) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().unwrap().insert(id, callback);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.subscribers.lock().unwrap().remove(&subscription.0);
    }
}

/// Builder for `MockWmsLayer`
pub struct MockWmsLayerBuilder {
    id: LayerId,
    allow_range: bool,
    time_instants: Vec<DateTime<Utc>>,
    visible: bool,
    reload_ms: u64,
    reload_jitter_ms: u64,
    fail_rate: f64,
}

impl MockWmsLayerBuilder {
    /// Whether the layer accepts interval time parameters.
    pub fn allow_range(mut self, allow_range: bool) -> Self {
        self.allow_range = allow_range;
        self
    }

    /// Discrete valid time instants (strictly ascending).
    pub fn time_instants(mut self, instants: Vec<DateTime<Utc>>) -> Self {
        self.time_instants = instants;
        self
    }

    /// Initial visibility.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Base simulated reload latency in milliseconds.
    pub fn reload_ms(mut self, reload_ms: u64) -> Self {
        self.reload_ms = reload_ms;
        self
    }

    /// Additional random latency bound in milliseconds.
    pub fn reload_jitter_ms(mut self, reload_jitter_ms: u64) -> Self {
        self.reload_jitter_ms = reload_jitter_ms;
        self
    }

    /// Fraction of reloads that fail, `0.0..=1.0`.
    pub fn fail_rate(mut self, fail_rate: f64) -> Self {
        self.fail_rate = fail_rate;
        self
    }

    /// Finish building.
    pub fn build(self) -> Arc<MockWmsLayer> {
        // Seed differs per layer id so jitter patterns are not in lockstep
        let seed = self
            .id
            .as_str()
            .bytes()
            .fold(0x9e37_79b9_7f4a_7c15u64, |acc, b| {
                acc.rotate_left(5) ^ u64::from(b)
            })
            | 1;

        Arc::new(MockWmsLayer {
            params: Mutex::new(WmsParams::get_map_defaults(self.id.as_str())),
            metadata: LayerMetadata {
                allow_range: self.allow_range,
                time_instants: self.time_instants.into(),
            },
            id: self.id,
            visible: AtomicBool::new(self.visible),
            reload_ms: self.reload_ms,
            reload_jitter_ms: self.reload_jitter_ms,
            fail_rate: self.fail_rate,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscription: AtomicU64::new(0),
            rng_state: AtomicU64::new(seed),
            reload_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        })
    }
}

/// Build mock layers for every definition in a blueprint.
pub fn build_layers(blueprint: &AnimationBlueprint) -> Vec<Arc<MockWmsLayer>> {
    blueprint.layers.iter().map(MockWmsLayer::from_config).collect()
}
