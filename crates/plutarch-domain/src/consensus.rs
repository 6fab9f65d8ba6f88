//! Scalar consensus records
//!
//! The vote itself lives in the reconciler; this module holds the ledger
//! bookkeeping and the closed status vocabulary.

use crate::{Claim, ClaimId, ClaimValue, EvidenceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Outcome of a scalar-fact vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStatus {
    /// One value met quorum and no other value did
    Verified,
    /// A value won against competing values
    ConflictResolved,
    /// Competing values could not be separated with enough support
    ConflictInconclusive,
    /// A single value without enough independent sources
    NoCorroboration,
    /// Several values, none with enough support
    Partial,
    /// No usable claims
    NoEvidence,
}

impl ConsensusStatus {
    /// Whether the status settles the fact and a scan may stop
    pub fn is_decisive(&self) -> bool {
        matches!(self, Self::Verified | Self::ConflictResolved)
    }

    /// Snake-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::ConflictResolved => "conflict_resolved",
            Self::ConflictInconclusive => "conflict_inconclusive",
            Self::NoCorroboration => "no_corroboration",
            Self::Partial => "partial",
            Self::NoEvidence => "no_evidence",
        }
    }
}

impl fmt::Display for ConsensusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claim backing one candidate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportingClaim {
    /// Claim id
    pub claim_id: ClaimId,
    /// Source domain
    pub source_domain: String,
    /// Evidence category
    pub evidence_type: EvidenceType,
    /// Quote, if any
    #[serde(default)]
    pub quote: String,
}

/// Tally for one candidate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueLedger {
    /// Candidate value
    pub value: ClaimValue,

    /// Independent (domain-deduplicated) source count
    pub count: usize,

    /// Domains that asserted the value
    pub domains: BTreeSet<String>,

    /// Every claim asserting the value, including same-domain repeats
    pub supporting_claims: Vec<SupportingClaim>,
}

impl ValueLedger {
    /// Start an empty ledger for a value
    pub fn new(value: ClaimValue) -> Self {
        Self {
            value,
            count: 0,
            domains: BTreeSet::new(),
            supporting_claims: Vec::new(),
        }
    }

    /// Record a claim; the count moves only for a new domain
    pub fn add(&mut self, claim: &Claim) {
        if self.domains.insert(claim.source_domain.clone()) {
            self.count += 1;
        }
        self.supporting_claims.push(SupportingClaim {
            claim_id: claim.claim_id.clone(),
            source_domain: claim.source_domain.clone(),
            evidence_type: claim.evidence_type,
            quote: claim.evidence_quote.clone(),
        });
    }

    /// Rank of the strongest supporting claim
    pub fn best_rank(&self) -> u8 {
        self.supporting_claims
            .iter()
            .map(|c| c.evidence_type.rank())
            .min()
            .unwrap_or(EvidenceType::Unknown.rank())
    }
}

/// Durable output for a single-valued fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarConsensus {
    /// Attribute name, e.g. `birth_year`
    pub attribute_name: String,

    /// Winning value, if any
    pub candidate_value: Option<ClaimValue>,

    /// Distinct source domains behind the reported value
    pub independent_source_count: usize,

    /// Vote outcome
    pub status: ConsensusStatus,

    /// Claims considered, including ones without a value
    pub total_claims: usize,

    /// One ledger per distinct value, ordered by value
    pub ledgers: Vec<ValueLedger>,
}

impl ScalarConsensus {
    /// Ledger for a value
    pub fn ledger(&self, value: &ClaimValue) -> Option<&ValueLedger> {
        self.ledgers.iter().find(|l| &l.value == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_dedups_domains() {
        let mut ledger = ValueLedger::new(ClaimValue::Year(1950));
        for (id, domain) in [("a", "x.org"), ("b", "x.org"), ("c", "y.org")] {
            ledger.add(&Claim::scalar(
                id,
                domain,
                Some(ClaimValue::Year(1950)),
                EvidenceType::Narrative,
            ));
        }
        assert_eq!(ledger.count, 2);
        assert_eq!(ledger.supporting_claims.len(), 3);
        assert_eq!(ledger.best_rank(), 1);
    }

    #[test]
    fn test_empty_ledger_rank_is_weakest() {
        let ledger = ValueLedger::new(ClaimValue::Year(1950));
        assert_eq!(ledger.best_rank(), 4);
    }

    #[test]
    fn test_decisive_statuses() {
        assert!(ConsensusStatus::Verified.is_decisive());
        assert!(ConsensusStatus::ConflictResolved.is_decisive());
        assert!(!ConsensusStatus::Partial.is_decisive());
        assert!(!ConsensusStatus::NoEvidence.is_decisive());
    }
}
