//! Configuration validation module
//!
//! Validation rules:
//! - layer ids unique and non-empty
//! - timeline.start <= timeline.end, step != 0
//! - sync option cross-field rules (range_interval required for range mode)
//! - per-layer time_instants strictly ascending
//! - fail_rate within [0, 1]
//! - sink required fields present

use std::collections::HashSet;

use contracts::{AnimationBlueprint, TimeSyncError};

/// Validate an AnimationBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &AnimationBlueprint) -> Result<(), TimeSyncError> {
    validate_timeline(blueprint)?;
    validate_sync_options(blueprint)?;
    validate_layer_ids(blueprint)?;
    validate_layer_instants(blueprint)?;
    validate_layer_fail_rates(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Validate timeline window and step
fn validate_timeline(blueprint: &AnimationBlueprint) -> Result<(), TimeSyncError> {
    let timeline = &blueprint.timeline;

    if timeline.start > timeline.end {
        return Err(TimeSyncError::config_validation(
            "timeline.start / timeline.end",
            format!(
                "start ({}) must be <= end ({})",
                timeline.start, timeline.end
            ),
        ));
    }

    if timeline.step == 0 {
        return Err(TimeSyncError::config_validation(
            "timeline.step",
            "step must be non-zero",
        ));
    }

    Ok(())
}

/// Validate synchronizer option combinations
fn validate_sync_options(blueprint: &AnimationBlueprint) -> Result<(), TimeSyncError> {
    blueprint.sync.validate()
}

/// Validate layer id uniqueness
fn validate_layer_ids(blueprint: &AnimationBlueprint) -> Result<(), TimeSyncError> {
    let mut seen = HashSet::new();
    for layer in &blueprint.layers {
        if layer.id.is_empty() {
            return Err(TimeSyncError::config_validation(
                "layers[].id",
                "layer id cannot be empty",
            ));
        }
        if !seen.insert(&layer.id) {
            return Err(TimeSyncError::config_validation(
                format!("layers[id={}]", layer.id),
                "duplicate layer id",
            ));
        }
    }
    Ok(())
}

/// Validate that each layer's discrete time index is strictly ascending
fn validate_layer_instants(blueprint: &AnimationBlueprint) -> Result<(), TimeSyncError> {
    for layer in &blueprint.layers {
        for (position, pair) in layer.time_instants.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(TimeSyncError::UnsortedTimeIndex {
                    layer_id: layer.id.clone(),
                    position: position + 1,
                });
            }
        }
    }
    Ok(())
}

/// Validate simulated failure rates
fn validate_layer_fail_rates(blueprint: &AnimationBlueprint) -> Result<(), TimeSyncError> {
    for layer in &blueprint.layers {
        if !(0.0..=1.0).contains(&layer.fail_rate) {
            return Err(TimeSyncError::config_validation(
                format!("layers[{}].fail_rate", layer.id),
                format!("fail_rate must be within [0, 1], got {}", layer.fail_rate),
            ));
        }
    }
    Ok(())
}

/// Validate sink configuration
fn validate_sinks(blueprint: &AnimationBlueprint) -> Result<(), TimeSyncError> {
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(TimeSyncError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
    }
    Ok(())
}
