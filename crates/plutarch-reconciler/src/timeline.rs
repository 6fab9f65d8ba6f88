//! Timeline ordering and summary

use plutarch_domain::{ConsolidatedEvent, Decision, EventKind};
use serde::{Deserialize, Serialize};

/// Consolidated events in chronological order, with summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Events sorted by `(time_start, time_end)`; undated events last
    pub events: Vec<ConsolidatedEvent>,

    /// Counts over `events`
    pub summary: TimelineSummary,
}

/// Summary statistics of a timeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSummary {
    /// Total events
    pub total_events: usize,
    /// Events with a start year
    pub with_time: usize,
    /// Events without any time information
    pub without_time: usize,
    /// Career positions
    pub career_positions: usize,
    /// Awards
    pub awards: usize,
    /// Events merged from several claims (`same_event` or `conflict_resolved`)
    pub merged: usize,
    /// Groups kept as `different_events`
    pub kept_distinct: usize,
    /// Events backed by a single claim
    pub singletons: usize,
    /// Earliest year mentioned
    pub earliest_year: Option<i32>,
    /// Latest year mentioned
    pub latest_year: Option<i32>,
}

/// Sort events chronologically
///
/// Ascending by start year, then end year; an open end sorts after any
/// closed end with the same start. Events without a start year go last in
/// their original order.
pub fn sort_events(events: &mut [ConsolidatedEvent]) {
    events.sort_by_key(|e| (e.time_start.is_none(), e.time_start, e.time_end.unwrap_or(i32::MAX)));
}

/// Build a timeline from arbiter output
///
/// # Examples
///
/// ```
/// use plutarch_reconciler::build_timeline;
///
/// let timeline = build_timeline(Vec::new());
/// assert_eq!(timeline.summary.total_events, 0);
/// assert_eq!(timeline.summary.earliest_year, None);
/// ```
pub fn build_timeline(mut events: Vec<ConsolidatedEvent>) -> Timeline {
    sort_events(&mut events);
    let summary = summarize(&events);
    Timeline { events, summary }
}

/// Compute summary statistics
pub fn summarize(events: &[ConsolidatedEvent]) -> TimelineSummary {
    let mut summary = TimelineSummary {
        total_events: events.len(),
        ..Default::default()
    };

    for event in events {
        if event.time_start.is_some() {
            summary.with_time += 1;
        } else {
            summary.without_time += 1;
        }

        match event.kind {
            EventKind::CareerPosition => summary.career_positions += 1,
            EventKind::Award => summary.awards += 1,
        }

        match event.decision {
            Decision::SameEvent | Decision::ConflictResolved => summary.merged += 1,
            Decision::DifferentEvents => summary.kept_distinct += 1,
            Decision::Singleton => summary.singletons += 1,
        }

        for year in [event.time_start, event.time_end].into_iter().flatten() {
            summary.earliest_year = Some(summary.earliest_year.map_or(year, |y| y.min(year)));
            summary.latest_year = Some(summary.latest_year.map_or(year, |y| y.max(year)));
        }
    }

    summary
}
