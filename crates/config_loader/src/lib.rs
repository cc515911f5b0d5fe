//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `AnimationBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("animation.toml")).unwrap();
//! println!("Layers: {}", blueprint.layers.len());
//! ```

mod parser;
mod validator;

pub use contracts::AnimationBlueprint;
pub use parser::ConfigFormat;

use contracts::TimeSyncError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<AnimationBlueprint, TimeSyncError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AnimationBlueprint, TimeSyncError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize AnimationBlueprint to TOML string
    pub fn to_toml(blueprint: &AnimationBlueprint) -> Result<String, TimeSyncError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| TimeSyncError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AnimationBlueprint to JSON string
    pub fn to_json(blueprint: &AnimationBlueprint) -> Result<String, TimeSyncError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| TimeSyncError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, TimeSyncError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            TimeSyncError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            TimeSyncError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, TimeSyncError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AnimationBlueprint, TimeSyncError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[timeline]
start = "2020-01-01T00:00:00Z"
end = "2020-01-31T00:00:00Z"
step = 1
unit = "days"
tick_interval_ms = 0

[sync]
interval_mode = "nearest"
range_mode = "off"

[[layers]]
id = "radar_composite"
title = "Radar composite"
time_instants = [
    "2020-01-01T00:00:00Z",
    "2020-01-03T00:00:00Z",
    "2020-01-05T00:00:00Z",
]
reload_ms = 5

[[layers]]
id = "satellite_ir"
allow_range = false

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.layers.len(), 2);
        assert!(!bp.layers[1].allow_range);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.layers.len(), bp2.layers.len());
        assert_eq!(bp.layers[0].id, bp2.layers[0].id);
        assert_eq!(bp.timeline.start, bp2.timeline.start);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.layers[0].id, bp2.layers[0].id);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Unsorted time index should fail validation
        let content = r#"
[timeline]
start = "2020-01-01T00:00:00Z"
end = "2020-01-31T00:00:00Z"

[[layers]]
id = "radar"
time_instants = ["2020-01-05T00:00:00Z", "2020-01-03T00:00:00Z"]
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not strictly ascending"));
    }
}
