//! Per-layer time resolution.
//!
//! Decision order (first matching branch wins):
//! 1. range modes, when enabled and the layer allows ranging
//! 2. discrete-interval snapping, when the layer has instants and the mode
//!    is not `exact`
//! 3. pass-through of the tick instant

use chrono::{DateTime, Utc};
use contracts::{
    IntervalMode, LayerId, LayerMetadata, RangeMode, SyncOptions, TimeParam, TimeRange,
    TimeSyncError,
};

use crate::instants::{check_ascending, find_nearest_instants};
use crate::units::add_units;

/// Outcome of resolving one layer's time parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeResolution {
    /// Push this parameter to the layer
    Apply(TimeParam),

    /// No valid instant exists for the tick time (`last_valid` underflow);
    /// the caller must hide the layer instead of applying a bogus time
    NoValidTime,
}

/// Resolve the time (or time-range) parameter for one layer.
///
/// Pure: no side effects on the layer. `layer_id` is only used for error
/// context.
///
/// # Errors
/// - `ConfigValidation` when range mode is active without a range interval
/// - `UnsortedTimeIndex` when the layer's instants are not strictly ascending
/// - `TimeArithmetic` when the range offset overflows
pub fn resolve_time(
    options: &SyncOptions,
    range: &TimeRange,
    layer_id: &LayerId,
    metadata: &LayerMetadata,
    time: DateTime<Utc>,
) -> Result<TimeResolution, TimeSyncError> {
    // Branch 1: range modes
    if options.range_mode.is_enabled() && metadata.allow_range {
        let param = match options.range_mode {
            RangeMode::Range => {
                let interval = options.range_interval.ok_or_else(|| {
                    TimeSyncError::config_validation(
                        "sync.range_interval",
                        "range_interval is required when range_mode = \"range\"",
                    )
                })?;
                // Offset endpoint first, whatever its sign; see TimeParam docs
                let start = add_units(time, interval, options.unit)?;
                TimeParam::Range { start, end: time }
            }
            RangeMode::Cumulative => TimeParam::Range {
                start: range.start,
                end: time,
            },
            RangeMode::Off => unreachable!("is_enabled() excludes Off"),
        };
        return Ok(TimeResolution::Apply(param));
    }

    // Branch 2: discrete-interval snapping
    let instants = &metadata.time_instants;
    if !instants.is_empty() && options.interval_mode != IntervalMode::Exact {
        if let Err(position) = check_ascending(instants) {
            return Err(TimeSyncError::UnsortedTimeIndex {
                layer_id: layer_id.to_string(),
                position,
            });
        }

        let search = find_nearest_instants(time, instants);

        if let Some(i) = search.exact {
            return Ok(TimeResolution::Apply(TimeParam::Instant(instants[i])));
        }

        let chosen = match options.interval_mode {
            IntervalMode::LastValid => match search.before {
                Some(i) => instants[i],
                None => return Ok(TimeResolution::NoValidTime),
            },
            IntervalMode::Nearest => nearest_of(time, instants, search.before, search.after),
            IntervalMode::Exact => unreachable!("guarded above"),
        };
        return Ok(TimeResolution::Apply(TimeParam::Instant(chosen)));
    }

    // Branch 3: pass-through (exact mode without a match, or no instants)
    Ok(TimeResolution::Apply(TimeParam::Instant(time)))
}

/// Pick the bracketing instant closest to the probe.
///
/// Equidistant brackets resolve to the *after* instant; a probe before every
/// instant falls back to the first one.
fn nearest_of(
    probe: DateTime<Utc>,
    instants: &[DateTime<Utc>],
    before: Option<usize>,
    after: Option<usize>,
) -> DateTime<Utc> {
    match (before, after) {
        (Some(b), Some(a)) => {
            let to_before = probe - instants[b];
            let to_after = instants[a] - probe;
            if to_after <= to_before {
                instants[a]
            } else {
                instants[b]
            }
        }
        (None, Some(a)) => instants[a],
        (Some(b), None) => instants[b],
        // Caller guarantees a non-empty index
        (None, None) => probe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn window() -> TimeRange {
        TimeRange::new(utc(2020, 1, 1), utc(2020, 1, 31)).unwrap()
    }

    fn layer_id() -> LayerId {
        "radar".into()
    }

    fn indexed_metadata() -> LayerMetadata {
        LayerMetadata::with_instants(vec![utc(2020, 1, 1), utc(2020, 1, 3), utc(2020, 1, 5)])
    }

    fn options(interval_mode: IntervalMode) -> SyncOptions {
        SyncOptions {
            interval_mode,
            ..Default::default()
        }
    }

    fn expect_param(resolution: TimeResolution) -> TimeParam {
        match resolution {
            TimeResolution::Apply(param) => param,
            TimeResolution::NoValidTime => panic!("expected a parameter, got NoValidTime"),
        }
    }

    #[test]
    fn test_worked_example_nearest_vs_last_valid() {
        // instants = [Jan 1, Jan 3, Jan 5], probe = Jan 4
        let meta = indexed_metadata();
        let probe = utc(2020, 1, 4);

        let nearest = resolve_time(
            &options(IntervalMode::Nearest),
            &window(),
            &layer_id(),
            &meta,
            probe,
        )
        .unwrap();
        assert_eq!(expect_param(nearest), TimeParam::Instant(utc(2020, 1, 5)));

        let last_valid = resolve_time(
            &options(IntervalMode::LastValid),
            &window(),
            &layer_id(),
            &meta,
            probe,
        )
        .unwrap();
        assert_eq!(
            expect_param(last_valid),
            TimeParam::Instant(utc(2020, 1, 3))
        );
    }

    #[test]
    fn test_exact_match_wins_in_every_mode() {
        let meta = indexed_metadata();
        let probe = utc(2020, 1, 3);

        for mode in [IntervalMode::Nearest, IntervalMode::LastValid] {
            let resolution =
                resolve_time(&options(mode), &window(), &layer_id(), &meta, probe).unwrap();
            assert_eq!(expect_param(resolution), TimeParam::Instant(probe));
        }
    }

    #[test]
    fn test_nearest_prefers_closer_instant() {
        let meta = indexed_metadata();

        // Jan 2 06:00 is closer to Jan 3 than to Jan 1
        let probe = Utc.with_ymd_and_hms(2020, 1, 2, 6, 0, 0).unwrap();
        let resolution = resolve_time(
            &options(IntervalMode::Nearest),
            &window(),
            &layer_id(),
            &meta,
            probe,
        )
        .unwrap();
        assert_eq!(expect_param(resolution), TimeParam::Instant(utc(2020, 1, 3)));

        // Jan 1 06:00 is closer to Jan 1
        let probe = Utc.with_ymd_and_hms(2020, 1, 1, 6, 0, 0).unwrap();
        let resolution = resolve_time(
            &options(IntervalMode::Nearest),
            &window(),
            &layer_id(),
            &meta,
            probe,
        )
        .unwrap();
        assert_eq!(expect_param(resolution), TimeParam::Instant(utc(2020, 1, 1)));
    }

    #[test]
    fn test_nearest_probe_outside_index() {
        let meta = indexed_metadata();

        // Precedes everything: falls back to the first instant
        let resolution = resolve_time(
            &options(IntervalMode::Nearest),
            &window(),
            &layer_id(),
            &meta,
            utc(2019, 12, 1),
        )
        .unwrap();
        assert_eq!(expect_param(resolution), TimeParam::Instant(utc(2020, 1, 1)));

        // Follows everything: sticks to the last instant
        let resolution = resolve_time(
            &options(IntervalMode::Nearest),
            &window(),
            &layer_id(),
            &meta,
            utc(2020, 1, 20),
        )
        .unwrap();
        assert_eq!(expect_param(resolution), TimeParam::Instant(utc(2020, 1, 5)));
    }

    #[test]
    fn test_last_valid_underflow_is_no_valid_time() {
        let meta = indexed_metadata();
        let resolution = resolve_time(
            &options(IntervalMode::LastValid),
            &window(),
            &layer_id(),
            &meta,
            utc(2019, 12, 1),
        )
        .unwrap();
        assert_eq!(resolution, TimeResolution::NoValidTime);
    }

    #[test]
    fn test_exact_mode_without_match_passes_tick_through() {
        let meta = indexed_metadata();
        let probe = utc(2020, 1, 4);
        let resolution = resolve_time(
            &options(IntervalMode::Exact),
            &window(),
            &layer_id(),
            &meta,
            probe,
        )
        .unwrap();
        assert_eq!(expect_param(resolution), TimeParam::Instant(probe));
    }

    #[test]
    fn test_no_instants_passes_tick_through() {
        let meta = LayerMetadata::continuous();
        let probe = utc(2020, 1, 4);
        let resolution = resolve_time(
            &SyncOptions::default(),
            &window(),
            &layer_id(),
            &meta,
            probe,
        )
        .unwrap();
        assert_eq!(expect_param(resolution), TimeParam::Instant(probe));
    }

    #[test]
    fn test_cumulative_range() {
        let options = SyncOptions {
            range_mode: RangeMode::Cumulative,
            ..Default::default()
        };
        let resolution = resolve_time(
            &options,
            &window(),
            &layer_id(),
            &LayerMetadata::continuous(),
            utc(2020, 1, 10),
        )
        .unwrap();
        let param = expect_param(resolution);
        assert_eq!(
            param.to_iso8601(),
            "2020-01-01T00:00:00Z/2020-01-10T00:00:00Z"
        );
    }

    #[test]
    fn test_range_mode_negative_interval() {
        let options = SyncOptions {
            range_mode: RangeMode::Range,
            range_interval: Some(-3),
            ..Default::default()
        };
        let resolution = resolve_time(
            &options,
            &window(),
            &layer_id(),
            &LayerMetadata::continuous(),
            utc(2020, 1, 10),
        )
        .unwrap();
        assert_eq!(
            expect_param(resolution).to_iso8601(),
            "2020-01-07T00:00:00Z/2020-01-10T00:00:00Z"
        );
    }

    #[test]
    fn test_range_mode_positive_interval_keeps_offset_first() {
        // The offset endpoint is emitted first even though it is later
        let options = SyncOptions {
            range_mode: RangeMode::Range,
            range_interval: Some(3),
            ..Default::default()
        };
        let resolution = resolve_time(
            &options,
            &window(),
            &layer_id(),
            &LayerMetadata::continuous(),
            utc(2020, 1, 10),
        )
        .unwrap();
        assert_eq!(
            expect_param(resolution).to_iso8601(),
            "2020-01-13T00:00:00Z/2020-01-10T00:00:00Z"
        );
    }

    #[test]
    fn test_range_mode_respects_allow_range() {
        // allow_range = false drops to interval snapping
        let options = SyncOptions {
            range_mode: RangeMode::Cumulative,
            ..Default::default()
        };
        let meta = LayerMetadata {
            allow_range: false,
            ..LayerMetadata::with_instants(vec![utc(2020, 1, 1), utc(2020, 1, 3), utc(2020, 1, 5)])
        };
        let resolution = resolve_time(
            &options,
            &window(),
            &layer_id(),
            &meta,
            utc(2020, 1, 4),
        )
        .unwrap();
        assert_eq!(expect_param(resolution), TimeParam::Instant(utc(2020, 1, 5)));
    }

    #[test]
    fn test_range_mode_without_interval_is_an_error() {
        let options = SyncOptions {
            range_mode: RangeMode::Range,
            range_interval: None,
            ..Default::default()
        };
        let result = resolve_time(
            &options,
            &window(),
            &layer_id(),
            &LayerMetadata::continuous(),
            utc(2020, 1, 10),
        );
        assert!(matches!(
            result,
            Err(TimeSyncError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_unsorted_index_is_an_error() {
        let meta = LayerMetadata::with_instants(vec![utc(2020, 1, 5), utc(2020, 1, 3)]);
        let result = resolve_time(
            &SyncOptions::default(),
            &window(),
            &layer_id(),
            &meta,
            utc(2020, 1, 4),
        );
        assert!(matches!(
            result,
            Err(TimeSyncError::UnsortedTimeIndex { position: 1, .. })
        ));
    }
}
