//! Incremental merge of new claims into consolidated events
//!
//! Each claim is judged against the active events by a [`MatchDecider`]
//! and either enriches one of them or becomes a new event. Enrichment only
//! ever widens: roles and locations are unioned, the span grows, and
//! confidence is never lowered.

use crate::metrics::{FallbackStage, RunMetrics};
use plutarch_domain::{
    CanonicalId, Confidence, ConsolidatedEvent, Contribution, Decision, EventClaim, EventId, EventSummary,
    MatchDecider, MatchDecision, Provenance, ReviewStatus, TimeSpan,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// What happened to one incoming claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// The incoming claim
    pub claim_id: String,
    /// Merged into an existing event or created a new one
    pub decision: MatchDecision,
    /// Code of the event the claim ended up in
    pub event_code: String,
    /// What the claim added when merged
    pub contribution: Contribution,
    /// Why
    pub reasoning: String,
    /// Confidence of the decision
    pub confidence: Confidence,
    /// Whether the decider failed and `new` was forced
    pub fell_back: bool,
}

/// Merges claims one at a time into an event pool
pub struct IncrementalMerger<D> {
    decider: D,
}

impl<D> IncrementalMerger<D>
where
    D: MatchDecider,
    D::Error: Display,
{
    /// Create a merger around a match decider
    pub fn new(decider: D) -> Self {
        Self { decider }
    }

    /// The decider in use
    pub fn decider(&self) -> &D {
        &self.decider
    }

    /// Merge claims in order; events created early are candidates for later claims
    pub fn merge_all(
        &self,
        events: &mut Vec<ConsolidatedEvent>,
        claims: &[EventClaim],
        metrics: &mut RunMetrics,
    ) -> Vec<MergeOutcome> {
        let outcomes: Vec<MergeOutcome> = claims
            .iter()
            .map(|claim| self.merge_claim(events, claim, metrics))
            .collect();
        info!(
            "Merged {} claims: {} into existing events, {} new",
            outcomes.len(),
            outcomes.iter().filter(|o| o.decision == MatchDecision::Merge).count(),
            outcomes.iter().filter(|o| o.decision == MatchDecision::New).count()
        );
        outcomes
    }

    /// Merge one claim into the pool
    pub fn merge_claim(
        &self,
        events: &mut Vec<ConsolidatedEvent>,
        claim: &EventClaim,
        metrics: &mut RunMetrics,
    ) -> MergeOutcome {
        let summaries: Vec<EventSummary> = events
            .iter()
            .filter(|e| e.is_active())
            .map(ConsolidatedEvent::summary)
            .collect();

        if summaries.is_empty() {
            return create_event(
                events,
                claim,
                "no existing events".to_string(),
                Confidence::High,
                false,
                metrics,
            );
        }

        let verdict = match self.decider.decide(claim, &summaries) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Match decision failed for {}: {}", claim.claim_id, e);
                metrics.record_fallback(FallbackStage::MatchDecision);
                return create_event(
                    events,
                    claim,
                    format!("match decision failed: {}", e),
                    Confidence::Low,
                    true,
                    metrics,
                );
            }
        };

        if verdict.decision == MatchDecision::New {
            return create_event(events, claim, verdict.reasoning, verdict.confidence, false, metrics);
        }

        let target = verdict.target_event_code.as_deref().and_then(|code| {
            events
                .iter()
                .position(|e| e.is_active() && e.event_code == code.trim())
        });

        let Some(index) = target else {
            warn!(
                "Decider chose merge into unknown event {:?} for {}",
                verdict.target_event_code, claim.claim_id
            );
            metrics.record_fallback(FallbackStage::MatchDecision);
            return create_event(
                events,
                claim,
                format!(
                    "merge target {} not found, created new event",
                    verdict.target_event_code.as_deref().unwrap_or("(none)")
                ),
                Confidence::Low,
                true,
                metrics,
            );
        };

        let event = &mut events[index];
        let contribution = enrich(event, claim);
        debug!(
            "{} merged into {} ({:?})",
            claim.claim_id, event.event_code, contribution
        );
        metrics.record_merge();

        MergeOutcome {
            claim_id: claim.claim_id.to_string(),
            decision: MatchDecision::Merge,
            event_code: event.event_code.clone(),
            contribution,
            reasoning: verdict.reasoning,
            confidence: verdict.confidence,
            fell_back: false,
        }
    }
}

/// Fold `claim` into `event`, returning what it contributed
///
/// Roles and locations are unioned, the span is extended (see
/// [`extend_span`]), a missing organization is filled in, and confidence is
/// upgraded but never lowered.
pub fn enrich(event: &mut ConsolidatedEvent, claim: &EventClaim) -> Contribution {
    let before_span = event.time_span();
    let widened = extend_span(&before_span, &claim.time);

    let new_roles = add_all(&mut event.roles, &claim.roles);
    let new_locations = add_all(&mut event.locations, &claim.locations);

    let contribution = if widened != before_span {
        Contribution::Time
    } else if new_roles {
        Contribution::Role
    } else if new_locations {
        Contribution::Location
    } else {
        Contribution::Confirmation
    };

    event.time_start = widened.start;
    event.time_end = widened.end;
    if event.organization.is_none() {
        event.organization = claim
            .organization
            .as_ref()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
    }
    event.confidence = event.confidence.upgraded(claim.confidence);
    event.provenance.record(claim, contribution);

    contribution
}

/// Extend an event's span with a claim's span
///
/// The start moves to the earliest defined year. A closed end moves to the
/// latest year the claim reaches. An open end ("to present") stays open
/// unless the claim states an explicit range ending at or after the event's
/// start; a single-year claim never closes it.
pub fn extend_span(event: &TimeSpan, claim: &TimeSpan) -> TimeSpan {
    let Some((claim_start, claim_end)) = claim.resolved() else {
        return *event;
    };
    let Some(start) = event.start else {
        return event.widened(claim);
    };

    let end = match event.end {
        Some(end) => Some(end.max(claim_end)),
        None => match claim.end {
            Some(end) if end > claim_start && end >= start => Some(end),
            _ => None,
        },
    };

    TimeSpan {
        start: Some(start.min(claim_start)),
        end,
    }
}

fn add_all(set: &mut BTreeSet<String>, values: &[String]) -> bool {
    let mut added = false;
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        added |= set.insert(value.to_string());
    }
    added
}

/// Canonical id of a pool event naming `name`, as display name or variant
fn known_organization(events: &[ConsolidatedEvent], name: &str) -> Option<CanonicalId> {
    let name = name.to_lowercase();
    events.iter().find_map(|event| {
        let id = event.canonical_organization_id.as_ref()?;
        let named = event
            .organization
            .iter()
            .chain(&event.provenance.variant_values.organizations)
            .any(|o| o.trim().to_lowercase() == name);
        named.then(|| id.clone())
    })
}

/// Next `N` code after the highest one already in the pool
fn next_code(events: &[ConsolidatedEvent]) -> String {
    let highest = events
        .iter()
        .filter_map(|e| e.event_code.strip_prefix('N'))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("N{:03}", highest + 1)
}

fn create_event(
    events: &mut Vec<ConsolidatedEvent>,
    claim: &EventClaim,
    reasoning: String,
    confidence: Confidence,
    fell_back: bool,
    metrics: &mut RunMetrics,
) -> MergeOutcome {
    let mut provenance = Provenance::default();
    provenance.record(claim, Contribution::Original);

    let time: TimeSpan = claim.time;
    let organization = claim
        .organization
        .as_ref()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty());
    let event = ConsolidatedEvent {
        event_id: EventId::new(),
        event_code: next_code(events),
        kind: claim.kind,
        decision: Decision::Singleton,
        canonical_organization_id: organization
            .as_deref()
            .and_then(|name| known_organization(events, name)),
        organization,
        time_start: time.start,
        time_end: time.end,
        roles: claim
            .roles
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
        locations: claim
            .locations
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        confidence: if fell_back { Confidence::Low } else { claim.confidence },
        reasoning: reasoning.clone(),
        provenance,
        review_status: ReviewStatus::Pending,
    };

    debug!("{} created {}", claim.claim_id, event.event_code);
    metrics.record_creation();

    let outcome = MergeOutcome {
        claim_id: claim.claim_id.to_string(),
        decision: MatchDecision::New,
        event_code: event.event_code.clone(),
        contribution: Contribution::Original,
        reasoning,
        confidence,
        fell_back,
    };
    events.push(event);
    outcome
}
