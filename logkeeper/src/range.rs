//! Range utilities.
//!
//! # Convention
//!
//! Public APIs accept `impl RangeBounds<Timestamp>` for ergonomic range
//! syntax (`..`, `5..`, `..10`, `5..=10`, etc.). Internal code uses concrete
//! half-open `Range<Timestamp>` values; conversion happens at the public API
//! boundary using [`normalize_timestamp`].

use std::ops::{Bound, Range, RangeBounds};

use crate::model::{Test, Timestamp};

/// Converts any `RangeBounds<Timestamp>` to a normalized `Range<Timestamp>`.
pub(crate) fn normalize_timestamp<R: RangeBounds<Timestamp>>(range: &R) -> Range<Timestamp> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => Timestamp::MAX,
    };
    start..end
}

/// Computes the active interval of `test` among the tests of its build.
///
/// The interval starts at the test's start marker and ends (exclusive) at the
/// start of the first test in `tests` that starts strictly later. The last
/// test of a build is unbounded above.
pub(crate) fn active_interval(test: &Test, tests: &[Test]) -> Range<Timestamp> {
    let end = tests
        .iter()
        .filter(|other| other.start > test.start)
        .map(|other| other.start)
        .min()
        .unwrap_or(Timestamp::MAX);
    test.start..end
}
