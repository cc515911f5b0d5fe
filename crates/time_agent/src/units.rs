//! Calendar-field arithmetic in timeline units.

use chrono::{DateTime, Months, TimeDelta, Utc};
use contracts::{TimeSyncError, TimeUnit};

/// Add a signed number of `unit`s to a UTC instant.
///
/// Seconds through weeks are fixed-length; months and years are
/// calendar-aware (end-of-month dates clamp, e.g. Jan 31 + 1 month =
/// Feb 29 in a leap year).
///
/// # Errors
/// `TimeArithmetic` when the result leaves chrono's representable range.
pub fn add_units(
    base: DateTime<Utc>,
    offset: i64,
    unit: TimeUnit,
) -> Result<DateTime<Utc>, TimeSyncError> {
    let result = match unit {
        TimeUnit::Seconds => TimeDelta::try_seconds(offset).and_then(|d| base.checked_add_signed(d)),
        TimeUnit::Minutes => TimeDelta::try_minutes(offset).and_then(|d| base.checked_add_signed(d)),
        TimeUnit::Hours => TimeDelta::try_hours(offset).and_then(|d| base.checked_add_signed(d)),
        TimeUnit::Days => TimeDelta::try_days(offset).and_then(|d| base.checked_add_signed(d)),
        TimeUnit::Weeks => TimeDelta::try_weeks(offset).and_then(|d| base.checked_add_signed(d)),
        TimeUnit::Months => add_months(base, offset),
        TimeUnit::Years => offset.checked_mul(12).and_then(|m| add_months(base, m)),
    };

    result.ok_or_else(|| TimeSyncError::TimeArithmetic {
        base: base.to_rfc3339(),
        offset,
        unit: unit.to_string(),
    })
}

fn add_months(base: DateTime<Utc>, offset: i64) -> Option<DateTime<Utc>> {
    let magnitude = u32::try_from(offset.unsigned_abs()).ok()?;
    if offset >= 0 {
        base.checked_add_months(Months::new(magnitude))
    } else {
        base.checked_sub_months(Months::new(magnitude))
    }
}
