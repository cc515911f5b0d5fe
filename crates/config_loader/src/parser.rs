//! Configuration parsing module
//!
//! Supports TOML (primary) and JSON (optional) formats. Timestamps must be
//! quoted RFC 3339 strings in both formats.

use contracts::{AnimationBlueprint, TimeSyncError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<AnimationBlueprint, TimeSyncError> {
    toml::from_str(content).map_err(|e| TimeSyncError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<AnimationBlueprint, TimeSyncError> {
    serde_json::from_str(content).map_err(|e| TimeSyncError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration content according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<AnimationBlueprint, TimeSyncError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
