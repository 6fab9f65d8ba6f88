//! Consolidation arbiter
//!
//! Turns each candidate group into one consolidated record. Singletons are
//! accepted directly; multi-member groups are judged by a [`Consolidator`].
//! Provenance is accumulated from every member whatever the verdict.

use crate::metrics::{FallbackStage, RunMetrics};
use crate::resolver::ResolvedEntities;
use plutarch_domain::{
    CandidateGroup, CanonicalId, Confidence, ConsolidatedEvent, ConsolidationVerdict, Consolidator,
    Contribution, Decision, EventClaim, EventId, Provenance, ReviewStatus, TimeSpan,
    VerdictDecision,
};
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Arbitrates candidate groups into consolidated events
pub struct ConsolidationArbiter<C> {
    consolidator: C,
}

impl<C> ConsolidationArbiter<C>
where
    C: Consolidator,
    C::Error: Display,
{
    /// Create an arbiter around a consolidator
    pub fn new(consolidator: C) -> Self {
        Self { consolidator }
    }

    /// The consolidator in use
    pub fn consolidator(&self) -> &C {
        &self.consolidator
    }

    /// Arbitrate every group, one record per group, in group order
    pub fn arbitrate(
        &self,
        claims: &[EventClaim],
        groups: &[CandidateGroup],
        entities: &ResolvedEntities,
        metrics: &mut RunMetrics,
    ) -> Vec<ConsolidatedEvent> {
        let mut events = Vec::with_capacity(groups.len());
        for group in groups {
            let members: Vec<&EventClaim> = group
                .member_indices
                .iter()
                .filter_map(|&i| claims.get(i))
                .collect();
            if members.is_empty() {
                warn!("{}: no member claims, skipped", group.group_id);
                continue;
            }
            if members.len() < group.member_indices.len() {
                warn!(
                    "{}: {} member indices out of range",
                    group.group_id,
                    group.member_indices.len() - members.len()
                );
            }
            let event = self.arbitrate_group(group, &members, entities, metrics);
            metrics.record_decision(event.decision);
            events.push(event);
        }

        info!("Arbitrated {} groups into consolidated events", events.len());
        events
    }

    fn arbitrate_group(
        &self,
        group: &CandidateGroup,
        members: &[&EventClaim],
        entities: &ResolvedEntities,
        metrics: &mut RunMetrics,
    ) -> ConsolidatedEvent {
        let provenance = accumulate_provenance(members);

        if let [claim] = members {
            return singleton_event(&group.group_id, claim, entities, provenance);
        }

        let owned: Vec<EventClaim> = members.iter().map(|&c| c.clone()).collect();
        match self.consolidator.consolidate(&owned) {
            Ok(verdict) => {
                debug!(
                    "{}: consolidator said {:?} ({})",
                    group.group_id, verdict.decision, verdict.reasoning
                );
                match verdict.decision {
                    VerdictDecision::SameEvent => {
                        same_event(&group.group_id, members, entities, verdict, provenance)
                    }
                    VerdictDecision::DifferentEvents => different_events(
                        &group.group_id,
                        members,
                        entities,
                        verdict.confidence.unwrap_or(Confidence::Medium),
                        verdict.reasoning,
                        provenance,
                    ),
                }
            }
            Err(e) => {
                warn!("{}: consolidation failed: {}", group.group_id, e);
                metrics.record_fallback(FallbackStage::Consolidate);
                different_events(
                    &group.group_id,
                    members,
                    entities,
                    Confidence::Low,
                    format!("parse failed: {}", e),
                    provenance,
                )
            }
        }
    }
}

/// Provenance seeded from every member claim
pub fn accumulate_provenance(members: &[&EventClaim]) -> Provenance {
    let mut provenance = Provenance::default();
    for (position, claim) in members.iter().enumerate() {
        let contribution = if position == 0 {
            Contribution::Original
        } else {
            Contribution::Confirmation
        };
        provenance.record(claim, contribution);
    }
    provenance
}

fn singleton_event(
    code: &str,
    claim: &EventClaim,
    entities: &ResolvedEntities,
    provenance: Provenance,
) -> ConsolidatedEvent {
    ConsolidatedEvent {
        event_id: EventId::new(),
        event_code: code.to_string(),
        kind: claim.kind,
        decision: Decision::Singleton,
        canonical_organization_id: entities.organization_id(claim).cloned(),
        organization: entities.organization_name(claim),
        time_start: claim.time.start,
        time_end: claim.time.end,
        roles: entities.role_names(claim),
        locations: trimmed(&claim.locations),
        confidence: Confidence::High,
        reasoning: "single claim".to_string(),
        provenance,
        review_status: ReviewStatus::Pending,
    }
}

fn same_event(
    code: &str,
    members: &[&EventClaim],
    entities: &ResolvedEntities,
    verdict: ConsolidationVerdict,
    provenance: Provenance,
) -> ConsolidatedEvent {
    let fields = verdict.fields;

    let org_ids: BTreeSet<&CanonicalId> = members
        .iter()
        .filter_map(|c| entities.organization_id(c))
        .collect();
    let decision = if org_ids.len() > 1 {
        Decision::ConflictResolved
    } else {
        Decision::SameEvent
    };

    let organization = fields
        .organization
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .or_else(|| members.iter().find_map(|c| entities.organization_name(c)));

    // Prefer the entity the chosen name resolves to
    let canonical_organization_id = organization
        .as_deref()
        .and_then(|name| {
            entities.organizations.canonical_id(name).cloned().or_else(|| {
                entities
                    .organizations
                    .entities()
                    .iter()
                    .find(|e| e.canonical_name == name)
                    .map(|e| e.canonical_id.clone())
            })
        })
        .or_else(|| org_ids.iter().next().map(|&id| id.clone()));

    let roles = if fields.roles.is_empty() {
        members.iter().flat_map(|c| entities.role_names(c)).collect()
    } else {
        trimmed(&fields.roles)
    };

    let locations = if fields.locations.is_empty() {
        members.iter().flat_map(|c| trimmed(&c.locations)).collect()
    } else {
        trimmed(&fields.locations)
    };

    let time = if fields.time.is_known() {
        fields.time
    } else {
        members
            .iter()
            .fold(TimeSpan::unknown(), |span, c| span.widened(&c.time))
    };

    let reasoning = if decision == Decision::ConflictResolved {
        format!(
            "{} (members named {} different organizations)",
            verdict.reasoning,
            org_ids.len()
        )
    } else {
        verdict.reasoning
    };

    ConsolidatedEvent {
        event_id: EventId::new(),
        event_code: code.to_string(),
        kind: members[0].kind,
        decision,
        canonical_organization_id,
        organization,
        time_start: time.start,
        time_end: time.end,
        roles,
        locations,
        confidence: verdict.confidence.unwrap_or(Confidence::High),
        reasoning,
        provenance,
        review_status: ReviewStatus::Pending,
    }
}

/// The group stays one record, represented by its earliest member
fn different_events(
    code: &str,
    members: &[&EventClaim],
    entities: &ResolvedEntities,
    confidence: Confidence,
    reasoning: String,
    provenance: Provenance,
) -> ConsolidatedEvent {
    let lead = members[0];
    ConsolidatedEvent {
        event_id: EventId::new(),
        event_code: code.to_string(),
        kind: lead.kind,
        decision: Decision::DifferentEvents,
        canonical_organization_id: entities.organization_id(lead).cloned(),
        organization: entities.organization_name(lead),
        time_start: lead.time.start,
        time_end: lead.time.end,
        roles: entities.role_names(lead),
        locations: trimmed(&lead.locations),
        confidence,
        reasoning,
        provenance,
        review_status: ReviewStatus::Pending,
    }
}

fn trimmed(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
