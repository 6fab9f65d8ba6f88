//! End-to-end reconciliation scenarios

use plutarch_domain::{
    Claim, ClaimValue, Confidence, ConsensusStatus, Contribution, Decision, EventClaim,
    EvidenceType, MatchDecision, TimeSpan,
};
use plutarch_llm::MockProvider;
use plutarch_reconciler::{
    FallbackStage, LlmCanonicalizer, LlmConsolidator, LlmMatchDecider, Reconciler,
    ReconcilerConfig, RuleCanonicalizer, RuleConsolidator, RuleMatchDecider,
};
use proptest::prelude::*;
use std::sync::Arc;

type LlmReconciler =
    Reconciler<LlmCanonicalizer<MockProvider>, LlmConsolidator<MockProvider>, LlmMatchDecider<MockProvider>>;
type RuleReconciler = Reconciler<RuleCanonicalizer, RuleConsolidator, RuleMatchDecider>;

fn llm_reconciler(llm: MockProvider) -> LlmReconciler {
    Reconciler::with_llm(Arc::new(llm), ReconcilerConfig::default()).unwrap()
}

fn rule_reconciler() -> RuleReconciler {
    let aliases = RuleCanonicalizer::new()
        .with_alias("World Bank", "World Bank Group")
        .with_alias("The World Bank", "World Bank Group");
    Reconciler::with_rules(aliases, ReconcilerConfig::default()).unwrap()
}

fn event(id: &str, domain: &str, org: &str, role: &str, time: TimeSpan) -> EventClaim {
    EventClaim::new(id, format!("doc-{}", id), domain)
        .with_organization(org)
        .with_role(role)
        .with_time(time)
        .with_quote(format!("{} at {}", role, org))
}

fn year(id: &str, domain: &str, value: i32, evidence: EvidenceType) -> Claim {
    Claim::scalar(id, domain, Some(ClaimValue::Year(value)), evidence)
        .with_attribute("birth_year")
}

#[test]
fn test_variant_names_collapse_into_one_entity() {
    let mut llm = MockProvider::new("no idea");
    llm.add_response_containing(
        "Entity type: organization",
        r#"{"same_entity": true, "canonical_name": "World Bank Group", "reasoning": "same institution", "confidence": "high"}"#,
    );
    llm.add_response_containing(
        "EVENT 1:",
        r#"{"decision": "same_event", "consolidated": {"organization": "World Bank Group", "roles": ["Economist"], "start_year": 1990, "end_year": 1995}, "reasoning": "same post", "confidence": "high"}"#,
    );

    let claims = vec![
        event("c1", "a.org", "World Bank", "Economist", TimeSpan::range(1990, 1995)),
        event("c2", "b.org", "The World Bank Group", "Economist", TimeSpan::point(1992)),
    ];
    let run = llm_reconciler(llm).reconcile(&claims);

    let orgs = run.entities.organizations.entities();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].canonical_name, "World Bank Group");
    assert_eq!(orgs[0].aliases.len(), 2);
    assert!(orgs[0].aliases.contains("World Bank"));
    assert!(orgs[0].aliases.contains("The World Bank Group"));

    let events = &run.timeline.events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].decision, Decision::SameEvent);
    assert_eq!(
        events[0].canonical_organization_id.as_ref(),
        Some(&orgs[0].canonical_id)
    );
}

#[test]
fn test_overlapping_claims_consolidate_to_widened_span() {
    let claims = vec![
        event("a", "a.org", "UNICEF", "Representative", TimeSpan::range(1990, 1995)),
        event("b", "b.org", "UNICEF", "Representative", TimeSpan::range(1992, 1994)),
    ];
    let run = rule_reconciler().reconcile(&claims);

    assert_eq!(run.groups.len(), 1);
    assert_eq!(run.groups[0].member_indices, vec![0, 1]);

    let events = &run.timeline.events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_code, "G001");
    assert_eq!(events[0].decision, Decision::SameEvent);
    assert_eq!(events[0].time_start, Some(1990));
    assert_eq!(events[0].time_end, Some(1995));
    assert_eq!(events[0].source_count(), 2);
}

#[test]
fn test_majority_birth_year_is_verified() {
    let claims = vec![
        year("f1", "a.org", 1950, EvidenceType::Narrative),
        year("f2", "b.org", 1950, EvidenceType::Narrative),
        year("f3", "c.org", 1950, EvidenceType::Other),
        year("f4", "d.org", 1951, EvidenceType::ExplicitField),
    ];
    let consensus = rule_reconciler().consensus("birth_year", &claims);

    assert_eq!(consensus.status, ConsensusStatus::Verified);
    assert_eq!(consensus.candidate_value, Some(ClaimValue::Year(1950)));
    assert_eq!(consensus.independent_source_count, 3);
}

#[test]
fn test_tied_birth_years_resolved_by_evidence_quality() {
    let claims = vec![
        year("f1", "a.org", 1950, EvidenceType::Narrative),
        year("f2", "b.org", 1950, EvidenceType::Narrative),
        year("f3", "c.org", 1951, EvidenceType::ExplicitField),
        year("f4", "d.org", 1951, EvidenceType::ExplicitField),
    ];
    let consensus = rule_reconciler().consensus("birth_year", &claims);

    assert_eq!(consensus.status, ConsensusStatus::ConflictResolved);
    assert_eq!(consensus.candidate_value, Some(ClaimValue::Year(1951)));
    assert_eq!(consensus.independent_source_count, 2);
}

#[test]
fn test_incremental_merge_enriches_existing_event() {
    let mut llm = MockProvider::new("no idea");
    llm.add_response_containing(
        "CANDIDATE:",
        r#"{"decision": "merge", "target_event_id": "S001", "reasoning": "same office", "confidence": "high"}"#,
    );
    let mut reconciler = llm_reconciler(llm.clone());

    let run = reconciler.reconcile(&[event(
        "c1",
        "who.int",
        "WHO",
        "Director-General",
        TimeSpan::open(2007),
    )]);
    let mut events = run.timeline.events;
    // A single claim needs no capability call
    assert_eq!(llm.call_count(), 0);

    let outcomes = reconciler.merge(
        &mut events,
        &[event("c2", "who.int", "WHO", "Chief Executive", TimeSpan::range(2007, 2017))],
    );

    assert_eq!(outcomes[0].decision, MatchDecision::Merge);
    assert_eq!(outcomes[0].event_code, "S001");
    assert_eq!(outcomes[0].contribution, Contribution::Time);
    assert!(!outcomes[0].fell_back);

    assert_eq!(events.len(), 1);
    let merged = &events[0];
    let roles: Vec<&str> = merged.roles.iter().map(String::as_str).collect();
    assert_eq!(roles, vec!["Chief Executive", "Director-General"]);
    assert_eq!(merged.time_start, Some(2007));
    assert_eq!(merged.time_end, Some(2017));
    assert_eq!(merged.source_count(), 1);
    assert_eq!(merged.provenance.source_claim_ids.len(), 2);
}

#[test]
fn test_unparsable_consolidation_keeps_claims_apart() {
    let llm = MockProvider::new("These look related but I cannot say for sure.");
    let mut reconciler = llm_reconciler(llm);

    let claims = vec![
        event("a", "a.org", "UNDP", "Adviser", TimeSpan::range(2000, 2004)),
        event("b", "b.org", "UNDP", "Adviser", TimeSpan::point(2002)),
        event("c", "c.org", "UNDP", "Adviser", TimeSpan::range(2003, 2006)),
    ];
    let run = reconciler.reconcile(&claims);

    let events = &run.timeline.events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].decision, Decision::DifferentEvents);
    assert_eq!(events[0].confidence, Confidence::Low);
    assert!(events[0].reasoning.starts_with("parse failed"));
    assert_eq!(events[0].provenance.source_claim_ids.len(), 3);
    assert_eq!(reconciler.metrics().fallback_count(FallbackStage::Consolidate), 1);
}

#[test]
fn test_failing_canonicalizer_falls_back_to_first_variant() {
    let mut llm = MockProvider::new("no idea");
    llm.add_error_containing("Entity type: organization");

    let claims = vec![
        event("a", "a.org", "World Bank", "Economist", TimeSpan::point(1990)),
        event("b", "b.org", "World Bank Group", "Economist", TimeSpan::point(2010)),
    ];
    let mut reconciler = llm_reconciler(llm);
    let run = reconciler.reconcile(&claims);

    let orgs = run.entities.organizations.entities();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].canonical_name, "World Bank");
    assert_eq!(orgs[0].confidence, Confidence::Low);
    assert_eq!(reconciler.metrics().fallback_count(FallbackStage::Canonicalize), 1);
    assert_eq!(run.timeline.events.len(), 2);
}

#[test]
fn test_rejected_events_are_not_merge_targets() {
    let mut reconciler = rule_reconciler();
    let run = reconciler.reconcile(&[event("a", "a.org", "WHO", "Adviser", TimeSpan::open(2007))]);
    let mut events = run.timeline.events;
    events[0].mark_rejected();

    let outcomes = reconciler.merge(
        &mut events,
        &[event("b", "b.org", "WHO", "Adviser", TimeSpan::point(2008))],
    );

    assert_eq!(outcomes[0].decision, MatchDecision::New);
    assert_eq!(outcomes[0].event_code, "N001");
    assert_eq!(events.len(), 2);
}

const ORGS: [&str; 4] = ["World Bank", "The World Bank", "WHO", "MIT"];
const ROLES: [&str; 2] = ["Economist", "Director"];

fn arb_claims() -> impl Strategy<Value = Vec<EventClaim>> {
    prop::collection::vec(
        (0..ORGS.len(), 0..ROLES.len(), prop::option::of((1990i32..2000, 0i32..5)), 0..3usize),
        0..8,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (org, role, time, domain))| {
                let span = match time {
                    Some((start, len)) => TimeSpan::range(start, start + len),
                    None => TimeSpan::unknown(),
                };
                event(&format!("c{}", i), &format!("d{}.org", domain), ORGS[org], ROLES[role], span)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_reconciliation_is_idempotent(claims in arb_claims()) {
        let first = rule_reconciler().reconcile(&claims);
        let second = rule_reconciler().reconcile(&claims);

        prop_assert_eq!(&first.entities, &second.entities);
        prop_assert_eq!(&first.groups, &second.groups);

        let shape = |run: &plutarch_reconciler::ReconcileRun| {
            run.timeline
                .events
                .iter()
                .map(|e| (e.event_code.clone(), e.decision, e.canonical_organization_id.clone()))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn prop_every_claim_lands_in_one_group(claims in arb_claims()) {
        let run = rule_reconciler().reconcile(&claims);
        let mut seen: Vec<usize> = run
            .groups
            .iter()
            .flat_map(|g| g.member_indices.iter().copied())
            .collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..claims.len()).collect::<Vec<_>>());
        prop_assert_eq!(run.timeline.events.len(), run.groups.len());
    }
}
