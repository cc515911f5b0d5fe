//! Nearest-instant search over a layer's discrete time index.

use chrono::{DateTime, Utc};

/// Result of probing a sorted instant list.
///
/// At most one of `exact`/`after` is set; `before` is the last index at or
/// below the probe when one exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstantSearch {
    /// Index of an exact (millisecond-equality) match
    pub exact: Option<usize>,

    /// Last index whose instant is <= the probe; `None` when the probe
    /// precedes every instant
    pub before: Option<usize>,

    /// First index whose instant is > the probe; `None` when the probe
    /// follows every instant
    pub after: Option<usize>,
}

/// Locate the probe within a strictly ascending instant list.
///
/// Linear ascending scan that stops at the first instant greater than the
/// probe. O(n), fine for the short per-layer indices this is used on.
pub fn find_nearest_instants(
    probe: DateTime<Utc>,
    instants: &[DateTime<Utc>],
) -> InstantSearch {
    let mut result = InstantSearch::default();

    for (i, instant) in instants.iter().enumerate() {
        if *instant == probe {
            result.exact = Some(i);
            break;
        }
        if *instant > probe {
            result.after = Some(i);
            break;
        }
        result.before = Some(i);
    }

    result
}

/// Check strict ascent, returning the offending position on failure.
pub(crate) fn check_ascending(instants: &[DateTime<Utc>]) -> Result<(), usize> {
    for (i, pair) in instants.windows(2).enumerate() {
        if pair[0] >= pair[1] {
            return Err(i + 1);
        }
    }
    Ok(())
}
