//! Synchronizer option contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::{TimeSyncError, TimeUnit};

/// Synchronizer options
///
/// The recognized configuration surface of the layer synchronizer. Settable
/// at construction; `validate` enforces the cross-field rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Snapping policy for layers with discrete valid time instants
    #[serde(default)]
    pub interval_mode: IntervalMode,

    /// Whether a single instant or an interval is sent to the layer
    #[serde(default)]
    pub range_mode: RangeMode,

    /// Signed offset, in timeline units, used to build the interval.
    /// Required iff `range_mode == Range`.
    #[serde(default)]
    pub range_interval: Option<i64>,

    /// Timeline step granularity; also the unit of `range_interval`
    #[serde(default = "default_unit")]
    pub unit: TimeUnit,
}

fn default_unit() -> TimeUnit {
    TimeUnit::Days
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            interval_mode: IntervalMode::default(),
            range_mode: RangeMode::default(),
            range_interval: None,
            unit: default_unit(),
        }
    }
}

impl SyncOptions {
    /// Check cross-field consistency.
    ///
    /// # Errors
    /// `Range` mode without a `range_interval` is rejected here instead of
    /// surfacing later as a bogus date computation.
    pub fn validate(&self) -> Result<(), TimeSyncError> {
        if self.range_mode == RangeMode::Range && self.range_interval.is_none() {
            return Err(TimeSyncError::config_validation(
                "sync.range_interval",
                "range_interval is required when range_mode = \"range\"",
            ));
        }
        Ok(())
    }
}

/// Policy for snapping the animation time to a layer's discrete instants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalMode {
    /// Keep displaying the latest valid instant at or before the tick time
    LastValid,
    /// Use the valid instant closest to the tick time
    #[default]
    Nearest,
    /// Only snap on an exact match; otherwise pass the tick time through
    Exact,
}

/// Policy for expressing the tick time as an interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMode {
    /// Single-value time parameters only
    #[default]
    Off,
    /// Interval built from the tick time and `range_interval`
    Range,
    /// Interval from the overall window start to the tick time
    Cumulative,
}

impl RangeMode {
    /// Whether any interval mode is active.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SyncOptions::default();
        assert_eq!(options.interval_mode, IntervalMode::Nearest);
        assert_eq!(options.range_mode, RangeMode::Off);
        assert_eq!(options.range_interval, None);
        assert_eq!(options.unit, TimeUnit::Days);
    }

    #[test]
    fn test_range_mode_requires_interval() {
        let options = SyncOptions {
            range_mode: RangeMode::Range,
            ..Default::default()
        };
        let err = options.validate().unwrap_err().to_string();
        assert!(err.contains("range_interval"), "got: {err}");

        let options = SyncOptions {
            range_mode: RangeMode::Range,
            range_interval: Some(-5),
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_cumulative_needs_no_interval() {
        let options = SyncOptions {
            range_mode: RangeMode::Cumulative,
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_serde_snake_case() {
        let parsed: IntervalMode = serde_json::from_str("\"last_valid\"").unwrap();
        assert_eq!(parsed, IntervalMode::LastValid);
        let parsed: RangeMode = serde_json::from_str("\"cumulative\"").unwrap();
        assert_eq!(parsed, RangeMode::Cumulative);
    }
}
