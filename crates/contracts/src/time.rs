//! Timeline primitives: ticks, windows, units, and outgoing time parameters.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TimeSyncError;

/// A tick notification from the timeline driver.
///
/// Carries the current animation instant. The active window and step unit
/// are agent state, supplied by the driver through `set_range` / options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTick {
    /// Current animation instant (UTC)
    pub current_time: DateTime<Utc>,
}

impl TimeTick {
    /// Create a tick at the given instant.
    #[inline]
    pub fn at(current_time: DateTime<Utc>) -> Self {
        Self { current_time }
    }
}

/// Inclusive time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Window start (inclusive)
    pub start: DateTime<Utc>,

    /// Window end (inclusive)
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new range, rejecting inverted bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeSyncError> {
        if start > end {
            return Err(TimeSyncError::InvalidTimeRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Whether `t` lies inside the window. Both bounds are inclusive.
    #[inline]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Step granularity of the timeline.
///
/// Matches the calendar fields a WMS `TIME` animation steps over. `Months`
/// and `Years` are calendar-aware (not fixed-length durations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        };
        write!(f, "{name}")
    }
}

/// Tick generation identifier.
///
/// Every in-range tick gets a fresh `RequestId`; layers echo it back in their
/// load events so completions from a superseded tick can be recognized and
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolved time parameter pushed to a layer.
///
/// For `Range`, `start` is the offset endpoint and is always emitted first,
/// even when a positive range interval places it chronologically *after*
/// `end`. This mirrors the long-standing WMS animation behavior; consumers
/// that need `lower/upper` ordering must normalize it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeParam {
    /// Single instant
    Instant(DateTime<Utc>),

    /// Interval of two instants, joined with `/` when formatted
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl TimeParam {
    /// Render the outgoing `TIME` parameter value.
    ///
    /// Instants format as `YYYY-MM-DDTHH:MM:SSZ`; ranges join both endpoints
    /// with `/`.
    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Instant(t) => format_instant(*t),
            Self::Range { start, end } => {
                format!("{}/{}", format_instant(*start), format_instant(*end))
            }
        }
    }
}

impl fmt::Display for TimeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

/// Format one UTC instant as `YYYY-MM-DDTHH:MM:SSZ`.
#[inline]
pub fn format_instant(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
