//! Production year-range value type and interval algebra.
//!
//! # Responsibility
//! - Represent one closed calendar-month span `[start, end]`.
//! - Provide pure interval operations: overlap, adjacency, merge, gap
//!   detection and exact-match diffing.
//!
//! # Invariants
//! - Every comparison goes through `year * 12 + month` month indexes.
//! - No operation mutates its inputs.
//! - `sort_and_merge_all` output is sorted ascending by start and no two
//!   consecutive ranges overlap or touch.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Closed calendar-month span embedded in a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start_year: i32,
    /// 1-based month.
    pub start_month: i32,
    pub end_year: i32,
    /// 1-based month.
    pub end_month: i32,
}

impl YearRange {
    pub fn new(start_year: i32, start_month: i32, end_year: i32, end_month: i32) -> Self {
        Self {
            start_year,
            start_month,
            end_year,
            end_month,
        }
    }

    /// Month index of the first covered month.
    pub fn start_index(&self) -> i64 {
        month_index(self.start_year, self.start_month)
    }

    /// Month index of the last covered month.
    pub fn end_index(&self) -> i64 {
        month_index(self.end_year, self.end_month)
    }

    /// Number of covered months, counting both ends.
    pub fn month_span(&self) -> i64 {
        self.end_index() - self.start_index() + 1
    }

    /// Returns whether start is not after end.
    pub fn is_valid(&self) -> bool {
        self.start_index() <= self.end_index()
    }

    /// Returns whether both months are calendar months (`1..=12`).
    pub fn has_calendar_months(&self) -> bool {
        (1..=12).contains(&self.start_month) && (1..=12).contains(&self.end_month)
    }

    /// Returns whether the two spans share at least one month.
    pub fn overlaps(&self, other: &YearRange) -> bool {
        self.start_index() <= other.end_index() && other.start_index() <= self.end_index()
    }

    /// Returns whether `next` starts exactly one month after `self` ends.
    ///
    /// Directional: callers that do not know the order must test both ways.
    pub fn is_followed_by(&self, next: &YearRange) -> bool {
        self.end_index() + 1 == next.start_index()
    }

    /// Merges two spans that overlap or touch in either direction.
    ///
    /// Returns `None` when a month gap separates them.
    pub fn merge(&self, other: &YearRange) -> Option<YearRange> {
        if !self.overlaps(other) && !self.is_followed_by(other) && !other.is_followed_by(self) {
            return None;
        }

        let start = if self.start_index() <= other.start_index() {
            self
        } else {
            other
        };
        let end = if self.end_index() >= other.end_index() {
            self
        } else {
            other
        };

        Some(YearRange {
            start_year: start.start_year,
            start_month: start.start_month,
            end_year: end.end_year,
            end_month: end.end_month,
        })
    }
}

impl Display for YearRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.start_year == self.end_year && self.start_month == self.end_month {
            write!(f, "{}-{:02}", self.start_year, self.start_month)
        } else if self.start_year == self.end_year {
            write!(
                f,
                "{}-{:02}~{:02}",
                self.start_year, self.start_month, self.end_month
            )
        } else {
            write!(
                f,
                "{}-{:02}~{}-{:02}",
                self.start_year, self.start_month, self.end_year, self.end_month
            )
        }
    }
}

/// Exact-match classification between two range sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeDiff {
    /// Present in the new set but not in the old one.
    pub added: Vec<YearRange>,
    /// Present in the old set but not in the new one.
    pub removed: Vec<YearRange>,
}

impl RangeDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

fn month_index(year: i32, month: i32) -> i64 {
    i64::from(year) * 12 + i64::from(month)
}

fn compare_by_start(a: &YearRange, b: &YearRange) -> Ordering {
    a.start_index()
        .cmp(&b.start_index())
        .then_with(|| a.end_index().cmp(&b.end_index()))
}

/// Returns a copy sorted ascending by start (ties by end).
pub fn sort_ranges(ranges: &[YearRange]) -> Vec<YearRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_by(compare_by_start);
    sorted
}

/// Sorts and collapses every overlapping or adjacent pair.
pub fn sort_and_merge_all(ranges: &[YearRange]) -> Vec<YearRange> {
    let sorted = sort_ranges(ranges);
    let mut merged: Vec<YearRange> = Vec::with_capacity(sorted.len());

    for range in sorted {
        match merged.last_mut() {
            Some(tail) => match tail.merge(&range) {
                Some(combined) => *tail = combined,
                None => merged.push(range),
            },
            None => merged.push(range),
        }
    }

    merged
}

/// Adds one range to an existing set and re-normalizes the result.
pub fn add_range(existing: &[YearRange], new_range: YearRange) -> Vec<YearRange> {
    let mut all = existing.to_vec();
    all.push(new_range);
    sort_and_merge_all(&all)
}

/// Returns whether at least one whole month is uncovered between two ranges.
///
/// Input order does not matter; ranges are compared after sorting.
pub fn has_gaps(ranges: &[YearRange]) -> bool {
    sort_ranges(ranges)
        .windows(2)
        .any(|pair| pair[1].start_index() - pair[0].end_index() > 1)
}

/// Classifies ranges as added/removed by exact field equality.
pub fn diff(old_ranges: &[YearRange], new_ranges: &[YearRange]) -> RangeDiff {
    let added = sort_ranges(new_ranges)
        .into_iter()
        .filter(|range| !old_ranges.contains(range))
        .collect();
    let removed = sort_ranges(old_ranges)
        .into_iter()
        .filter(|range| !new_ranges.contains(range))
        .collect();

    RangeDiff { added, removed }
}
