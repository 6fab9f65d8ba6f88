//! Scalar consensus by independent-source quorum
//!
//! One ledger per distinct value; each ledger counts distinct source
//! domains. The top value wins when it reaches quorum; ties are broken by
//! the strongest evidence type behind each value.

use crate::config::ReconcilerConfig;
use plutarch_domain::{
    Claim, ClaimValue, ConsensusStatus, Extractor, ScalarConsensus, SourceChunk, ValueLedger,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Write};
use tracing::{debug, info, warn};

/// Incremental consensus over a stream of scalar claims
///
/// # Examples
///
/// ```
/// use plutarch_domain::{Claim, ClaimValue, ConsensusStatus, EvidenceType};
/// use plutarch_reconciler::ConsensusTracker;
///
/// let mut tracker = ConsensusTracker::new("birth_year", 2);
/// for (id, domain) in [("a", "x.org"), ("b", "y.org")] {
///     tracker.observe(&Claim::scalar(id, domain, Some(ClaimValue::Year(1950)), EvidenceType::Narrative));
/// }
/// assert!(tracker.is_decisive());
/// assert_eq!(tracker.current().status, ConsensusStatus::Verified);
/// ```
#[derive(Debug, Clone)]
pub struct ConsensusTracker {
    attribute: String,
    quorum: usize,
    ledgers: Vec<ValueLedger>,
    total_claims: usize,
}

impl ConsensusTracker {
    /// Start tracking `attribute` with the given quorum
    pub fn new(attribute: impl Into<String>, quorum: usize) -> Self {
        Self {
            attribute: attribute.into(),
            quorum,
            ledgers: Vec::new(),
            total_claims: 0,
        }
    }

    /// Add one claim; returns whether it was counted
    ///
    /// Claims with no value, or naming a different attribute, are ignored.
    pub fn observe(&mut self, claim: &Claim) -> bool {
        let Some(value) = &claim.raw_value else {
            return false;
        };
        if !claim.asserts(&self.attribute) {
            return false;
        }

        self.total_claims += 1;
        match self.ledgers.iter_mut().find(|l| &l.value == value) {
            Some(ledger) => ledger.add(claim),
            None => {
                let mut ledger = ValueLedger::new(value.clone());
                ledger.add(claim);
                self.ledgers.push(ledger);
            }
        }
        true
    }

    /// Positive claims counted so far
    pub fn total_claims(&self) -> usize {
        self.total_claims
    }

    /// Whether the current status is `verified` or `conflict_resolved`
    pub fn is_decisive(&self) -> bool {
        decide(&self.ledgers, self.quorum).2.is_decisive()
    }

    /// Consensus over everything observed so far
    pub fn current(&self) -> ScalarConsensus {
        let (candidate_value, independent_source_count, status) =
            decide(&self.ledgers, self.quorum);
        ScalarConsensus {
            attribute_name: self.attribute.clone(),
            candidate_value,
            independent_source_count,
            status,
            total_claims: self.total_claims,
            ledgers: self.ledgers.clone(),
        }
    }
}

/// Consensus for one attribute over a claim list
pub fn compute_consensus(
    attribute: &str,
    claims: &[Claim],
    quorum: usize,
) -> ScalarConsensus {
    let mut tracker = ConsensusTracker::new(attribute, quorum);
    for claim in claims {
        tracker.observe(claim);
    }
    let consensus = tracker.current();
    info!(
        "{}: {} (value {:?}, {} independent sources, {} claims)",
        attribute,
        consensus.status,
        consensus.candidate_value,
        consensus.independent_source_count,
        consensus.total_claims
    );
    consensus
}

fn decide(ledgers: &[ValueLedger], quorum: usize) -> (Option<ClaimValue>, usize, ConsensusStatus) {
    let Some(max_count) = ledgers.iter().map(|l| l.count).max() else {
        return (None, 0, ConsensusStatus::NoEvidence);
    };
    let top: Vec<&ValueLedger> = ledgers.iter().filter(|l| l.count == max_count).collect();

    if let [winner] = top.as_slice() {
        let value = Some(winner.value.clone());
        if max_count >= quorum {
            let contested = ledgers
                .iter()
                .any(|l| l.value != winner.value && l.count >= quorum);
            let status = if contested {
                ConsensusStatus::ConflictResolved
            } else {
                ConsensusStatus::Verified
            };
            return (value, max_count, status);
        }
        if ledgers.len() == 1 {
            return (value, max_count, ConsensusStatus::NoCorroboration);
        }
        return (None, max_count, ConsensusStatus::Partial);
    }

    // Tie on independent sources; strongest evidence breaks it
    let best_rank = top.iter().map(|l| l.best_rank()).min().unwrap_or(u8::MAX);
    let strongest: Vec<&&ValueLedger> = top.iter().filter(|l| l.best_rank() == best_rank).collect();

    match strongest.as_slice() {
        [winner] => {
            let status = if winner.count >= quorum {
                ConsensusStatus::ConflictResolved
            } else {
                ConsensusStatus::ConflictInconclusive
            };
            (Some(winner.value.clone()), winner.count, status)
        }
        // Same count and rank at quorum: the first value seen wins
        [first, ..] if max_count >= quorum => (
            Some(first.value.clone()),
            first.count,
            ConsensusStatus::ConflictResolved,
        ),
        _ => (None, max_count, ConsensusStatus::Partial),
    }
}

/// Human-readable account of a consensus decision
pub fn narrative(consensus: &ScalarConsensus) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Consensus for {}", consensus.attribute_name);
    let _ = writeln!(text, "Status: {}", consensus.status);
    let _ = writeln!(
        text,
        "Independent source count: {}",
        consensus.independent_source_count
    );
    let _ = writeln!(text, "Claims considered: {}", consensus.total_claims);

    match consensus
        .candidate_value
        .as_ref()
        .and_then(|v| consensus.ledger(v))
    {
        Some(winner) => {
            let _ = writeln!(text, "Value: {}", winner.value);
            let _ = writeln!(
                text,
                "Supporting domains: {}",
                join(winner.domains.iter())
            );
            let mut types: Vec<&str> = winner
                .supporting_claims
                .iter()
                .map(|c| c.evidence_type.label())
                .collect();
            types.sort_unstable();
            types.dedup();
            let _ = writeln!(text, "Evidence types: {}", types.join(", "));

            let others: Vec<&ValueLedger> = consensus
                .ledgers
                .iter()
                .filter(|l| l.value != winner.value)
                .collect();
            if !others.is_empty() {
                let _ = writeln!(text, "Competing values:");
                for ledger in others {
                    let _ = writeln!(
                        text,
                        "  {} in {} source(s): {}",
                        ledger.value,
                        ledger.count,
                        join(ledger.domains.iter())
                    );
                }
            }
        }
        None => {
            let _ = writeln!(text, "No value could be accepted");
            if !consensus.ledgers.is_empty() {
                let _ = writeln!(text, "Partial evidence:");
                for ledger in &consensus.ledgers {
                    let _ = writeln!(
                        text,
                        "  {} in {} source(s): {}",
                        ledger.value,
                        ledger.count,
                        join(ledger.domains.iter())
                    );
                }
            }
        }
    }

    text
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// A chunk whose extraction failed during a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailure {
    /// Chunk identifier
    pub source_id: String,
    /// Error message
    pub error: String,
}

/// Result of an early-stopping scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Consensus over the claims scanned
    pub consensus: ScalarConsensus,
    /// Chunks handed to the extractor
    pub chunks_scanned: usize,
    /// Positive claims counted
    pub claims_scanned: usize,
    /// Whether the scan ended before the input ran out
    pub stopped_early: bool,
    /// Chunks that could not be extracted
    pub failures: Vec<ScanFailure>,
}

/// Scan chunks in order, extracting scalar claims until consensus is decisive
///
/// Stops once at least `early_stop_min_claims` positive claims give a
/// decisive status (when `early_stop` is on), or after `max_claims_scanned`
/// positive claims. Extraction failures are recorded and skipped.
pub fn scan_for_consensus<E>(
    extractor: &E,
    chunks: &[SourceChunk],
    attribute: &str,
    config: &ReconcilerConfig,
) -> ScanOutcome
where
    E: Extractor,
    E::Error: Display,
{
    let mut tracker = ConsensusTracker::new(attribute, config.quorum);
    let mut failures = Vec::new();
    let mut chunks_scanned = 0;
    let mut stopped_early = false;

    'chunks: for (position, chunk) in chunks.iter().enumerate() {
        chunks_scanned += 1;
        let claims = match extractor.extract(chunk) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Extraction failed for {}: {}", chunk.source_id, e);
                failures.push(ScanFailure {
                    source_id: chunk.source_id.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        for fact in &claims.facts {
            if !tracker.observe(fact) {
                continue;
            }
            debug!(
                "{}: {} from {}",
                attribute,
                fact.raw_value.as_ref().map(ToString::to_string).unwrap_or_default(),
                fact.source_domain
            );

            let decisive = config.early_stop
                && tracker.total_claims() >= config.early_stop_min_claims
                && tracker.is_decisive();
            if decisive || tracker.total_claims() >= config.max_claims_scanned {
                stopped_early = position + 1 < chunks.len();
                if decisive {
                    info!(
                        "Early stop after {} claims in {} chunks",
                        tracker.total_claims(),
                        chunks_scanned
                    );
                }
                break 'chunks;
            }
        }
    }

    ScanOutcome {
        consensus: tracker.current(),
        chunks_scanned,
        claims_scanned: tracker.total_claims(),
        stopped_early,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plutarch_domain::{ChunkClaims, EvidenceType};
    use proptest::prelude::*;

    fn year(id: &str, domain: &str, y: i32, evidence: EvidenceType) -> Claim {
        Claim::scalar(id, domain, Some(ClaimValue::Year(y)), evidence).with_attribute("birth_year")
    }

    #[test]
    fn test_no_claims_is_no_evidence() {
        let c = compute_consensus("birth_year", &[], 2);
        assert_eq!(c.status, ConsensusStatus::NoEvidence);
        assert_eq!(c.candidate_value, None);
        assert_eq!(c.independent_source_count, 0);
    }

    #[test]
    fn test_valueless_claims_are_discarded() {
        let claims = vec![Claim::scalar("a", "x.org", None, EvidenceType::Other)];
        let c = compute_consensus("birth_year", &claims, 2);
        assert_eq!(c.status, ConsensusStatus::NoEvidence);
        assert_eq!(c.total_claims, 0);
    }

    #[test]
    fn test_majority_with_minority_dissent_is_verified() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::Narrative),
            year("b", "b.org", 1950, EvidenceType::Narrative),
            year("c", "c.org", 1950, EvidenceType::Other),
            year("d", "d.org", 1951, EvidenceType::Narrative),
        ];
        let c = compute_consensus("birth_year", &claims, 2);
        assert_eq!(c.status, ConsensusStatus::Verified);
        assert_eq!(c.candidate_value, Some(ClaimValue::Year(1950)));
        assert_eq!(c.independent_source_count, 3);
        assert_eq!(c.ledgers.len(), 2);
    }

    #[test]
    fn test_two_values_at_quorum_is_conflict_resolved() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::Narrative),
            year("b", "b.org", 1950, EvidenceType::Narrative),
            year("c", "c.org", 1950, EvidenceType::Narrative),
            year("d", "d.org", 1951, EvidenceType::Narrative),
            year("e", "e.org", 1951, EvidenceType::Narrative),
        ];
        let c = compute_consensus("birth_year", &claims, 2);
        assert_eq!(c.status, ConsensusStatus::ConflictResolved);
        assert_eq!(c.candidate_value, Some(ClaimValue::Year(1950)));
    }

    #[test]
    fn test_tie_broken_by_evidence_rank() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::Narrative),
            year("b", "b.org", 1950, EvidenceType::Narrative),
            year("c", "c.org", 1951, EvidenceType::ExplicitField),
            year("d", "d.org", 1951, EvidenceType::ExplicitField),
        ];
        let c = compute_consensus("birth_year", &claims, 2);
        assert_eq!(c.status, ConsensusStatus::ConflictResolved);
        assert_eq!(c.candidate_value, Some(ClaimValue::Year(1951)));
        assert_eq!(c.independent_source_count, 2);
    }

    #[test]
    fn test_tie_below_quorum_is_inconclusive() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::CategoryOnly),
            year("b", "b.org", 1951, EvidenceType::ExplicitField),
        ];
        let c = compute_consensus("birth_year", &claims, 2);
        assert_eq!(c.status, ConsensusStatus::ConflictInconclusive);
        assert_eq!(c.candidate_value, Some(ClaimValue::Year(1951)));
    }

    #[test]
    fn test_undecidable_tie() {
        let below = compute_consensus(
            "birth_year",
            &[
                year("a", "a.org", 1950, EvidenceType::Narrative),
                year("b", "b.org", 1951, EvidenceType::Narrative),
            ],
            2,
        );
        assert_eq!(below.status, ConsensusStatus::Partial);
        assert_eq!(below.candidate_value, None);

        let at_quorum = compute_consensus(
            "birth_year",
            &[
                year("a", "a.org", 1950, EvidenceType::Narrative),
                year("b", "b.org", 1950, EvidenceType::Narrative),
                year("c", "c.org", 1951, EvidenceType::Narrative),
                year("d", "d.org", 1951, EvidenceType::Narrative),
            ],
            2,
        );
        assert_eq!(at_quorum.status, ConsensusStatus::ConflictResolved);
        assert_eq!(at_quorum.candidate_value, Some(ClaimValue::Year(1950)));
        assert_eq!(at_quorum.independent_source_count, 2);
    }

    #[test]
    fn test_undecidable_tie_at_quorum_follows_first_seen_value() {
        let c = compute_consensus(
            "birth_year",
            &[
                year("a", "a.org", 1951, EvidenceType::Narrative),
                year("b", "b.org", 1950, EvidenceType::Narrative),
                year("c", "c.org", 1950, EvidenceType::Narrative),
                year("d", "d.org", 1951, EvidenceType::Narrative),
            ],
            2,
        );
        assert_eq!(c.status, ConsensusStatus::ConflictResolved);
        assert_eq!(c.candidate_value, Some(ClaimValue::Year(1951)));
    }

    #[test]
    fn test_single_source_is_no_corroboration() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::ExplicitField),
            year("b", "a.org", 1950, EvidenceType::Narrative),
        ];
        let c = compute_consensus("birth_year", &claims, 2);
        assert_eq!(c.status, ConsensusStatus::NoCorroboration);
        assert_eq!(c.candidate_value, Some(ClaimValue::Year(1950)));
        assert_eq!(c.independent_source_count, 1);
        assert_eq!(c.total_claims, 2);
    }

    #[test]
    fn test_unique_top_below_quorum_with_rivals_is_partial() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::Narrative),
            year("b", "b.org", 1950, EvidenceType::Narrative),
            year("c", "c.org", 1951, EvidenceType::Narrative),
        ];
        let c = compute_consensus("birth_year", &claims, 3);
        assert_eq!(c.status, ConsensusStatus::Partial);
        assert_eq!(c.candidate_value, None);
        assert_eq!(c.independent_source_count, 2);
    }

    #[test]
    fn test_other_attributes_ignored() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::Narrative),
            Claim::scalar("b", "b.org", Some(ClaimValue::Year(1990)), EvidenceType::Narrative)
                .with_attribute("death_year"),
        ];
        let c = compute_consensus("birth_year", &claims, 1);
        assert_eq!(c.status, ConsensusStatus::Verified);
        assert_eq!(c.total_claims, 1);
    }

    #[test]
    fn test_narrative_mentions_winner_and_rivals() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::ExplicitField),
            year("b", "b.org", 1950, EvidenceType::Narrative),
            year("c", "c.org", 1951, EvidenceType::CategoryOnly),
        ];
        let text = narrative(&compute_consensus("birth_year", &claims, 2));
        assert!(text.contains("Status: verified"));
        assert!(text.contains("Value: 1950"));
        assert!(text.contains("Supporting domains: a.org, b.org"));
        assert!(text.contains("Evidence types: explicit-field, narrative"));
        assert!(text.contains("1951 in 1 source(s): c.org"));
    }

    #[test]
    fn test_narrative_without_value() {
        let claims = vec![
            year("a", "a.org", 1950, EvidenceType::Narrative),
            year("b", "b.org", 1951, EvidenceType::Narrative),
        ];
        let text = narrative(&compute_consensus("birth_year", &claims, 2));
        assert!(text.contains("Status: partial"));
        assert!(text.contains("No value could be accepted"));
        assert!(text.contains("1950 in 1 source(s): a.org"));
    }

    struct ScriptedExtractor(Vec<Result<Vec<Claim>, String>>);

    impl Extractor for ScriptedExtractor {
        type Error = String;

        fn extract(&self, chunk: &SourceChunk) -> Result<ChunkClaims, String> {
            let index: usize = chunk.source_id.parse().map_err(|_| "bad id".to_string())?;
            self.0[index].clone().map(|facts| ChunkClaims {
                source_id: chunk.source_id.clone(),
                events: Vec::new(),
                facts,
            })
        }
    }

    fn chunks(n: usize) -> Vec<SourceChunk> {
        (0..n)
            .map(|i| SourceChunk {
                source_id: i.to_string(),
                source_domain: format!("d{}.org", i),
                text: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_scan_stops_once_decisive() {
        let extractor = ScriptedExtractor(vec![
            Ok(vec![year("a", "a.org", 1950, EvidenceType::Narrative)]),
            Err("timeout".to_string()),
            Ok(vec![]),
            Ok(vec![year("b", "b.org", 1950, EvidenceType::ExplicitField)]),
            Ok(vec![year("c", "c.org", 1951, EvidenceType::Narrative)]),
        ]);
        let outcome = scan_for_consensus(&extractor, &chunks(5), "birth_year", &ReconcilerConfig::default());

        assert!(outcome.stopped_early);
        assert_eq!(outcome.chunks_scanned, 4);
        assert_eq!(outcome.claims_scanned, 2);
        assert_eq!(outcome.consensus.status, ConsensusStatus::Verified);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].source_id, "1");
    }

    #[test]
    fn test_scan_without_early_stop_reads_everything() {
        let extractor = ScriptedExtractor(vec![
            Ok(vec![year("a", "a.org", 1950, EvidenceType::Narrative)]),
            Ok(vec![year("b", "b.org", 1950, EvidenceType::Narrative)]),
            Ok(vec![year("c", "c.org", 1951, EvidenceType::Narrative)]),
        ]);
        let config = ReconcilerConfig {
            early_stop: false,
            ..Default::default()
        };
        let outcome = scan_for_consensus(&extractor, &chunks(3), "birth_year", &config);

        assert!(!outcome.stopped_early);
        assert_eq!(outcome.chunks_scanned, 3);
        assert_eq!(outcome.consensus.total_claims, 3);
        assert_eq!(outcome.consensus.status, ConsensusStatus::Verified);
    }

    #[test]
    fn test_scan_respects_claim_cap() {
        let extractor = ScriptedExtractor(vec![
            Ok(vec![
                year("a", "a.org", 1950, EvidenceType::Narrative),
                year("b", "b.org", 1951, EvidenceType::Narrative),
            ]),
            Ok(vec![year("c", "c.org", 1952, EvidenceType::Narrative)]),
        ]);
        let config = ReconcilerConfig {
            early_stop_min_claims: 2,
            max_claims_scanned: 2,
            ..Default::default()
        };
        let outcome = scan_for_consensus(&extractor, &chunks(2), "birth_year", &config);

        assert!(outcome.stopped_early);
        assert_eq!(outcome.claims_scanned, 2);
        assert_eq!(outcome.chunks_scanned, 1);
        assert_eq!(outcome.consensus.status, ConsensusStatus::Partial);
    }

    proptest! {
        #[test]
        fn prop_source_count_bounded_by_claims(
            votes in proptest::collection::vec((1948i32..1952, 0usize..4, 0usize..4), 0..20),
            quorum in 1usize..4,
        ) {
            let evidence = [
                EvidenceType::ExplicitField,
                EvidenceType::Narrative,
                EvidenceType::Other,
                EvidenceType::CategoryOnly,
            ];
            let claims: Vec<Claim> = votes
                .iter()
                .enumerate()
                .map(|(i, (y, d, e))| year(&format!("c{}", i), &format!("d{}.org", d), *y, evidence[*e]))
                .collect();
            let c = compute_consensus("birth_year", &claims, quorum);

            prop_assert!(c.independent_source_count <= claims.len());
            for ledger in &c.ledgers {
                prop_assert!(ledger.count <= ledger.supporting_claims.len());
                prop_assert_eq!(ledger.count, ledger.domains.len());
            }
            if c.candidate_value.is_none() {
                prop_assert!(matches!(
                    c.status,
                    ConsensusStatus::NoEvidence | ConsensusStatus::Partial
                ));
                prop_assert!(c.independent_source_count < quorum);
            }
            if c.status.is_decisive() {
                prop_assert!(c.independent_source_count >= quorum);
            }
        }
    }
}
