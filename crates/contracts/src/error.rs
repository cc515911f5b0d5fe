//! Layered error definitions
//!
//! Categorized by source: config / time / layer / agent / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum TimeSyncError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Time Errors =====
    /// Inverted time range (start after end)
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: String, end: String },

    /// Calendar arithmetic left the representable range
    #[error("time arithmetic overflow: {base} {offset:+} {unit}")]
    TimeArithmetic {
        base: String,
        offset: i64,
        unit: String,
    },

    /// Discrete time index is not strictly ascending
    #[error("time index for layer '{layer_id}' is not strictly ascending at position {position}")]
    UnsortedTimeIndex { layer_id: String, position: usize },

    // ===== Layer Errors =====
    /// Layer is not in the managed collection
    #[error("layer not managed: {layer_id}")]
    LayerNotManaged { layer_id: String },

    /// Layer is already in the managed collection
    #[error("layer already managed: {layer_id}")]
    LayerAlreadyManaged { layer_id: String },

    // ===== Agent Errors =====
    /// Agent was destroyed and can no longer process ticks
    #[error("agent destroyed: {message}")]
    AgentDestroyed { message: String },

    /// Layers did not finish reloading before the deadline
    #[error("readiness timeout: waited {waited_ms}ms for {pending} pending layer(s)")]
    ReadinessTimeout { waited_ms: u64, pending: usize },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink creation error
    #[error("sink '{sink_name}' creation error: {message}")]
    SinkCreation { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TimeSyncError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create layer-not-managed error
    pub fn layer_not_managed(layer_id: impl Into<String>) -> Self {
        Self::LayerNotManaged {
            layer_id: layer_id.into(),
        }
    }

    /// Create layer-already-managed error
    pub fn layer_already_managed(layer_id: impl Into<String>) -> Self {
        Self::LayerAlreadyManaged {
            layer_id: layer_id.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink creation error
    pub fn sink_creation(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
