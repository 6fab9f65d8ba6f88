//! Year-granularity time spans

use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive span of years
///
/// A missing `start` means the claim carries no time information. On a
/// consolidated event a missing `end` means open-ended ("to present") or
/// unknown; on a single claim it is resolved to `start` for overlap tests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TimeSpan {
    /// First year, inclusive
    #[serde(default)]
    pub start: Option<i32>,

    /// Last year, inclusive
    #[serde(default)]
    pub end: Option<i32>,
}

impl TimeSpan {
    /// A span with no time information
    pub fn unknown() -> Self {
        Self::default()
    }

    /// A single-year assertion; `end` defaults to `start`
    pub fn point(year: i32) -> Self {
        Self {
            start: Some(year),
            end: Some(year),
        }
    }

    /// A closed range
    pub fn range(start: i32, end: i32) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A range that is still ongoing
    pub fn open(start: i32) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Whether any time information is present
    pub fn is_known(&self) -> bool {
        self.start.is_some()
    }

    /// Resolve to a concrete `(start, end)` pair for overlap testing
    ///
    /// Returns `None` when the start is missing.
    pub fn resolved(&self) -> Option<(i32, i32)> {
        let start = self.start?;
        Some((start, self.end.unwrap_or(start)))
    }

    /// Two spans overlap iff `not (end1 < start2 or end2 < start1)`
    ///
    /// # Examples
    ///
    /// ```
    /// use plutarch_domain::TimeSpan;
    ///
    /// assert!(TimeSpan::range(1990, 1995).overlaps(&TimeSpan::range(1992, 1994)));
    /// assert!(!TimeSpan::point(1990).overlaps(&TimeSpan::point(1991)));
    /// assert!(!TimeSpan::unknown().overlaps(&TimeSpan::point(1990)));
    /// ```
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        match (self.resolved(), other.resolved()) {
            (Some((s1, e1)), Some((s2, e2))) => !(e1 < s2 || e2 < s1),
            _ => false,
        }
    }

    /// Widen this span to cover `other`: earliest defined start, latest defined end
    pub fn widened(&self, other: &TimeSpan) -> TimeSpan {
        TimeSpan {
            start: min_defined(self.start, other.start),
            end: max_defined(self.end, other.end),
        }
    }
}

fn min_defined(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn max_defined(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, _) => write!(f, "Unknown"),
            (Some(s), Some(e)) if s == e => write!(f, "{}", s),
            (Some(s), Some(e)) => write!(f, "{}-{}", s, e),
            (Some(s), None) => write!(f, "{}-present", s),
        }
    }
}
