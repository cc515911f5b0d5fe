//! WMS time agent implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{
    AppliedTime, LayerEvent, LayerEventKind, LayerId, RequestId, SkipReason, SkippedLayer,
    SubscriptionId, SyncOptions, TickOutcome, TimeAgent, TimeLayer, TimeRange, TimeSyncError,
    TimeTick,
};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace, warn};

use crate::resolve::{resolve_time, TimeResolution};

/// Agent state over one tick cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No reloads pending; the driver may advance
    Idle,
    /// Waiting for this many layer reloads from the current tick
    Resolving {
        /// Layers whose reload has not completed
        pending: usize,
    },
}

/// A managed layer together with its event subscription
struct ManagedLayer {
    layer: Arc<dyn TimeLayer>,
    subscription: SubscriptionId,
}

/// Tick-driven synchronizer for WMS-style time-indexed layers
///
/// Subscribes to each managed layer's load events; on every in-range tick it
/// resolves a time parameter per layer, pushes it, and tracks the resulting
/// reloads so the timeline driver can gate advancement on `can_advance`.
///
/// Load events are tagged with the tick generation (`RequestId`) they belong
/// to; completions from a superseded tick are ignored instead of corrupting
/// the fresh pending count.
pub struct WmsTimeAgent {
    options: SyncOptions,
    range: TimeRange,
    layers: Vec<ManagedLayer>,
    current_time: Option<DateTime<Utc>>,
    /// Tick generation; bumped on every in-range tick
    generation: u64,
    state: SyncState,
    event_tx: mpsc::UnboundedSender<LayerEvent>,
    event_rx: mpsc::UnboundedReceiver<LayerEvent>,
    destroyed: bool,
}

impl WmsTimeAgent {
    /// Create a new agent with the given options and active window.
    ///
    /// # Errors
    /// Rejects inconsistent options (range mode without a range interval).
    pub fn new(options: SyncOptions, range: TimeRange) -> Result<Self, TimeSyncError> {
        options.validate()?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok(Self {
            options,
            range,
            layers: Vec::new(),
            current_time: None,
            generation: 0,
            state: SyncState::Idle,
            event_tx,
            event_rx,
            destroyed: false,
        })
    }

    /// Create an agent and register an initial layer set.
    pub fn with_layers(
        options: SyncOptions,
        range: TimeRange,
        layers: Vec<Arc<dyn TimeLayer>>,
    ) -> Result<Self, TimeSyncError> {
        let mut agent = Self::new(options, range)?;
        for layer in layers {
            agent.add_layer(layer)?;
        }
        Ok(agent)
    }

    /// Current tick-cycle state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// The last tick's instant, if any tick has arrived.
    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.current_time
    }

    /// The active window.
    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Number of managed layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Drain queued load events without blocking.
    pub fn pump_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Process one load event.
    fn handle_event(&mut self, event: LayerEvent) {
        if event.request.0 != self.generation {
            trace!(
                layer = %event.layer_id,
                request = %event.request,
                current = self.generation,
                "ignoring stale load event"
            );
            metrics::counter!("timesync_stale_events_total").increment(1);
            return;
        }

        match event.kind {
            // Load starts are observed but intentionally not counted; the
            // visible-layer snapshot taken at tick start governs gating.
            LayerEventKind::LoadStart => {
                trace!(layer = %event.layer_id, request = %event.request, "layer load started");
            }
            LayerEventKind::LoadEnd => {
                trace!(layer = %event.layer_id, request = %event.request, "layer load ended");
                self.complete_one();
            }
        }
    }

    /// Retire one pending reload slot; flips to `Idle` at zero.
    fn complete_one(&mut self) {
        if let SyncState::Resolving { pending } = self.state {
            let pending = pending.saturating_sub(1);
            metrics::gauge!("timesync_pending_layers").set(pending as f64);
            if pending == 0 {
                debug!(generation = self.generation, "all layer reloads settled");
                self.state = SyncState::Idle;
            } else {
                self.state = SyncState::Resolving { pending };
            }
        }
    }

    /// Resolve and apply the time parameter for one layer.
    fn apply_layer(
        &mut self,
        layer: &Arc<dyn TimeLayer>,
        time: DateTime<Utc>,
        request: RequestId,
        outcome: &mut TickOutcome,
    ) {
        let was_visible = layer.is_visible();
        let metadata = layer.metadata();

        match resolve_time(&self.options, &self.range, layer.id(), &metadata, time) {
            Ok(TimeResolution::Apply(param)) => {
                let reloading = layer.apply_time(&param, request);
                trace!(
                    layer = %layer.id(),
                    param = %param,
                    reloading,
                    "time parameter applied"
                );
                // A parameter that changed nothing never produces a load-end;
                // retire its slot now so the gate cannot deadlock.
                if was_visible && !reloading {
                    self.complete_one();
                }
                outcome.applied.push(AppliedTime {
                    layer_id: layer.id().clone(),
                    param: param.to_iso8601(),
                    reloading,
                });
            }
            Ok(TimeResolution::NoValidTime) => {
                debug!(layer = %layer.id(), "no valid instant at tick time; hiding layer");
                layer.set_visibility(false);
                if was_visible {
                    self.complete_one();
                }
                outcome.skipped.push(SkippedLayer {
                    layer_id: layer.id().clone(),
                    reason: SkipReason::NoValidTime,
                });
            }
            Err(e) => {
                warn!(layer = %layer.id(), error = %e, "time resolution failed; hiding layer");
                layer.set_visibility(false);
                if was_visible {
                    self.complete_one();
                }
                outcome.skipped.push(SkippedLayer {
                    layer_id: layer.id().clone(),
                    reason: SkipReason::ResolveFailed(e.to_string()),
                });
            }
        }
    }

    fn ensure_alive(&self) -> Result<(), TimeSyncError> {
        if self.destroyed {
            return Err(TimeSyncError::AgentDestroyed {
                message: "agent has been destroyed".into(),
            });
        }
        Ok(())
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        for entry in self.layers.drain(..) {
            entry.layer.unsubscribe(entry.subscription);
        }
        self.state = SyncState::Idle;
        self.destroyed = true;
        debug!("agent destroyed");
    }
}

impl TimeAgent for WmsTimeAgent {
    fn add_layer(&mut self, layer: Arc<dyn TimeLayer>) -> Result<(), TimeSyncError> {
        self.ensure_alive()?;
        if self.layers.iter().any(|e| e.layer.id() == layer.id()) {
            return Err(TimeSyncError::layer_already_managed(layer.id().as_str()));
        }

        let tx = self.event_tx.clone();
        let subscription = layer.subscribe(Arc::new(move |event| {
            // The agent may already be gone when a late event fires; a closed
            // channel is fine.
            let _ = tx.send(event);
        }));

        debug!(layer = %layer.id(), "layer added");
        self.layers.push(ManagedLayer {
            layer,
            subscription,
        });
        Ok(())
    }

    fn remove_layer(&mut self, layer_id: &LayerId) -> Result<(), TimeSyncError> {
        self.ensure_alive()?;
        let position = self
            .layers
            .iter()
            .position(|e| e.layer.id() == layer_id)
            .ok_or_else(|| TimeSyncError::layer_not_managed(layer_id.as_str()))?;

        let entry = self.layers.remove(position);
        entry.layer.unsubscribe(entry.subscription);
        debug!(layer = %layer_id, "layer removed");
        Ok(())
    }

    fn set_range(&mut self, range: TimeRange) {
        self.range = range;
    }

    #[instrument(
        name = "agent_on_tick",
        skip(self, tick),
        fields(time = %tick.current_time, layers = self.layers.len())
    )]
    fn on_tick(&mut self, tick: &TimeTick) -> Result<TickOutcome, TimeSyncError> {
        self.ensure_alive()?;

        // Settle anything queued before the snapshot below
        self.pump_events();

        let time = tick.current_time;
        self.current_time = Some(time);
        let in_range = self.range.contains(time);

        let mut outcome = TickOutcome {
            request: RequestId(self.generation),
            current_time: time,
            in_range,
            pending_at_start: 0,
            applied: Vec::new(),
            skipped: Vec::new(),
        };

        if !in_range {
            // Outside the window every layer goes dark; pending reloads from
            // the last in-range tick keep draining in the background.
            for entry in &self.layers {
                entry.layer.set_visibility(false);
            }
            debug!(time = %time, "tick outside active window; layers hidden");
            metrics::counter!("timesync_ticks_total", "result" => "out_of_range").increment(1);
            return Ok(outcome);
        }

        self.generation += 1;
        let request = RequestId(self.generation);
        outcome.request = request;

        let pending = self
            .layers
            .iter()
            .filter(|e| e.layer.is_visible())
            .count();
        outcome.pending_at_start = pending;
        self.state = if pending == 0 {
            SyncState::Idle
        } else {
            SyncState::Resolving { pending }
        };
        metrics::gauge!("timesync_pending_layers").set(pending as f64);
        debug!(
            generation = self.generation,
            pending, "in-range tick; resolving layers"
        );

        let layers: Vec<Arc<dyn TimeLayer>> =
            self.layers.iter().map(|e| e.layer.clone()).collect();
        for layer in &layers {
            self.apply_layer(layer, time, request, &mut outcome);
        }

        metrics::counter!("timesync_ticks_total", "result" => "in_range").increment(1);
        metrics::counter!("timesync_layers_applied_total").increment(outcome.applied.len() as u64);
        metrics::counter!("timesync_layers_skipped_total").increment(outcome.skipped.len() as u64);

        Ok(outcome)
    }

    fn pending_loads(&self) -> usize {
        match self.state {
            SyncState::Idle => 0,
            SyncState::Resolving { pending } => pending,
        }
    }

    fn can_advance(&mut self) -> bool {
        self.pump_events();
        self.state == SyncState::Idle
    }

    async fn wait_ready(&mut self, timeout: Duration) -> Result<(), TimeSyncError> {
        self.pump_events();
        if self.state == SyncState::Idle {
            return Ok(());
        }

        let deadline = tokio::time::Instant::now() + timeout;
        while self.state != SyncState::Idle {
            match tokio::time::timeout_at(deadline, self.event_rx.recv()).await {
                Ok(Some(event)) => self.handle_event(event),
                // The agent holds a sender itself, so the channel never closes
                Ok(None) => break,
                Err(_) => {
                    return Err(TimeSyncError::ReadinessTimeout {
                        waited_ms: timeout.as_millis() as u64,
                        pending: self.pending_loads(),
                    });
                }
            }
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.teardown();
    }
}

impl Drop for WmsTimeAgent {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::{IntervalMode, LayerEventCallback, LayerMetadata, RangeMode, TimeParam};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn window() -> TimeRange {
        TimeRange::new(utc(2020, 1, 1), utc(2020, 1, 31)).unwrap()
    }

    /// Scripted layer: records applied parameters, emits events on demand.
    struct ScriptedLayer {
        id: LayerId,
        metadata: LayerMetadata,
        visible: AtomicBool,
        reload_on_apply: bool,
        applied: Mutex<Vec<(String, RequestId)>>,
        subscribers: Mutex<HashMap<u64, LayerEventCallback>>,
        next_subscription: AtomicU64,
    }

    impl ScriptedLayer {
        fn new(id: &str) -> Arc<Self> {
            Self::with_metadata(id, LayerMetadata::continuous())
        }

        fn with_metadata(id: &str, metadata: LayerMetadata) -> Arc<Self> {
            Arc::new(Self {
                id: id.into(),
                metadata,
                visible: AtomicBool::new(true),
                reload_on_apply: true,
                applied: Mutex::new(Vec::new()),
                subscribers: Mutex::new(HashMap::new()),
                next_subscription: AtomicU64::new(0),
            })
        }

        fn without_reloads(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.into(),
                metadata: LayerMetadata::continuous(),
                visible: AtomicBool::new(true),
                reload_on_apply: false,
                applied: Mutex::new(Vec::new()),
                subscribers: Mutex::new(HashMap::new()),
                next_subscription: AtomicU64::new(0),
            })
        }

        fn emit(&self, kind: LayerEventKind, request: RequestId) {
            let subscribers = self.subscribers.lock().unwrap();
            for callback in subscribers.values() {
                callback(LayerEvent {
                    layer_id: self.id.clone(),
                    request,
                    kind,
                });
            }
        }

        fn applied_count(&self) -> usize {
            self.applied.lock().unwrap().len()
        }

        fn subscriber_count(&self) -> usize {
            self.subscribers.lock().unwrap().len()
        }
    }

    impl TimeLayer for ScriptedLayer {
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
            self.visible.store(visible, Ordering::SeqCst);
        }

        fn apply_time(&self, param: &TimeParam, request: RequestId) -> bool {
            self.applied
                .lock()
                .unwrap()
                .push((param.to_iso8601(), request));
            self.reload_on_apply && self.is_visible()
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

    fn agent_with(layers: &[Arc<ScriptedLayer>]) -> WmsTimeAgent {
        let mut agent = WmsTimeAgent::new(SyncOptions::default(), window()).unwrap();
        for layer in layers {
            agent
                .add_layer(Arc::clone(layer) as Arc<dyn TimeLayer>)
                .unwrap();
        }
        agent
    }

    #[test]
    fn test_out_of_range_tick_hides_layers_without_applying() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 3, 1))).unwrap();

        assert!(!outcome.in_range);
        assert!(!layer.is_visible());
        assert_eq!(layer.applied_count(), 0);
        assert!(agent.can_advance());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        assert!(agent.on_tick(&TimeTick::at(utc(2020, 1, 1))).unwrap().in_range);
        assert!(agent.on_tick(&TimeTick::at(utc(2020, 1, 31))).unwrap().in_range);
    }

    #[test]
    fn test_pending_count_conservation() {
        let a = ScriptedLayer::new("a");
        let b = ScriptedLayer::new("b");
        let hidden = ScriptedLayer::new("hidden");
        hidden.set_visibility(false);

        let mut agent = agent_with(&[Arc::clone(&a), Arc::clone(&b), Arc::clone(&hidden)]);
        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();

        // Snapshot counts only the visible layers
        assert_eq!(outcome.pending_at_start, 2);
        assert_eq!(agent.pending_loads(), 2);
        assert!(!agent.can_advance());

        a.emit(LayerEventKind::LoadEnd, outcome.request);
        assert!(!agent.can_advance());
        assert_eq!(agent.pending_loads(), 1);

        b.emit(LayerEventKind::LoadEnd, outcome.request);
        assert!(agent.can_advance());
        assert_eq!(agent.pending_loads(), 0);
    }

    #[test]
    fn test_load_start_is_not_counted() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);
        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();

        layer.emit(LayerEventKind::LoadStart, outcome.request);
        assert!(!agent.can_advance());
        assert_eq!(agent.pending_loads(), 1);

        layer.emit(LayerEventKind::LoadEnd, outcome.request);
        assert!(agent.can_advance());
    }

    #[test]
    fn test_stale_load_end_is_ignored() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        let first = agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();
        let second = agent.on_tick(&TimeTick::at(utc(2020, 1, 11))).unwrap();
        assert_ne!(first.request, second.request);

        // A slow completion from the first tick must not drain the second
        layer.emit(LayerEventKind::LoadEnd, first.request);
        assert!(!agent.can_advance());
        assert_eq!(agent.pending_loads(), 1);

        layer.emit(LayerEventKind::LoadEnd, second.request);
        assert!(agent.can_advance());
    }

    #[test]
    fn test_no_visible_layers_collapses_to_idle() {
        let layer = ScriptedLayer::new("radar");
        layer.set_visibility(false);
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();
        assert_eq!(outcome.pending_at_start, 0);
        assert!(agent.can_advance());
    }

    #[test]
    fn test_apply_without_reload_completes_immediately() {
        let layer = ScriptedLayer::without_reloads("static");
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();
        assert_eq!(outcome.pending_at_start, 1);
        assert!(!outcome.applied[0].reloading);
        // No load-end will ever come; the slot was retired inline
        assert!(agent.can_advance());
    }

    #[test]
    fn test_last_valid_underflow_hides_layer() {
        let layer = ScriptedLayer::with_metadata(
            "indexed",
            LayerMetadata::with_instants(vec![utc(2020, 1, 10), utc(2020, 1, 20)]),
        );
        let options = SyncOptions {
            interval_mode: IntervalMode::LastValid,
            ..Default::default()
        };
        let mut agent = WmsTimeAgent::new(options, window()).unwrap();
        agent
            .add_layer(Arc::clone(&layer) as Arc<dyn TimeLayer>)
            .unwrap();

        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 1, 5))).unwrap();

        assert!(!layer.is_visible());
        assert_eq!(outcome.applied.len(), 0);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::NoValidTime);
        assert!(agent.can_advance());
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        let result = agent.add_layer(Arc::clone(&layer) as Arc<dyn TimeLayer>);
        assert!(matches!(
            result,
            Err(TimeSyncError::LayerAlreadyManaged { .. })
        ));
        assert_eq!(agent.layer_count(), 1);
    }

    #[test]
    fn test_add_then_remove_restores_subscriptions() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = WmsTimeAgent::new(SyncOptions::default(), window()).unwrap();

        assert_eq!(layer.subscriber_count(), 0);
        agent
            .add_layer(Arc::clone(&layer) as Arc<dyn TimeLayer>)
            .unwrap();
        assert_eq!(layer.subscriber_count(), 1);

        agent.remove_layer(&"radar".into()).unwrap();
        assert_eq!(layer.subscriber_count(), 0);
        assert_eq!(agent.layer_count(), 0);
    }

    #[test]
    fn test_remove_unknown_layer() {
        let mut agent = WmsTimeAgent::new(SyncOptions::default(), window()).unwrap();
        let result = agent.remove_layer(&"ghost".into());
        assert!(matches!(result, Err(TimeSyncError::LayerNotManaged { .. })));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        agent.destroy();
        assert_eq!(layer.subscriber_count(), 0);
        assert_eq!(agent.layer_count(), 0);

        // Second destroy is a no-op, not undefined behavior
        agent.destroy();

        let result = agent.on_tick(&TimeTick::at(utc(2020, 1, 10)));
        assert!(matches!(result, Err(TimeSyncError::AgentDestroyed { .. })));
    }

    #[test]
    fn test_set_range_moves_the_window() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);

        agent.set_range(TimeRange::new(utc(2020, 2, 1), utc(2020, 2, 28)).unwrap());
        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();
        assert!(!outcome.in_range);
    }

    #[test]
    fn test_invalid_options_rejected_at_construction() {
        let options = SyncOptions {
            range_mode: RangeMode::Range,
            range_interval: None,
            ..Default::default()
        };
        assert!(WmsTimeAgent::new(options, window()).is_err());
    }

    #[tokio::test]
    async fn test_wait_ready_returns_once_loads_settle() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);
        let outcome = agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();

        layer.emit(LayerEventKind::LoadEnd, outcome.request);
        agent
            .wait_ready(Duration::from_millis(100))
            .await
            .unwrap();
        assert!(agent.can_advance());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ready_times_out_on_silent_layer() {
        let layer = ScriptedLayer::new("radar");
        let mut agent = agent_with(&[Arc::clone(&layer)]);
        agent.on_tick(&TimeTick::at(utc(2020, 1, 10))).unwrap();

        let result = agent.wait_ready(Duration::from_secs(5)).await;
        match result {
            Err(TimeSyncError::ReadinessTimeout { pending, .. }) => assert_eq!(pending, 1),
            other => panic!("expected ReadinessTimeout, got {other:?}"),
        }
    }
}
