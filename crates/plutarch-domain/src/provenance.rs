//! Provenance tracking for consolidated records

use crate::{ClaimId, EventClaim, EvidenceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a piece of evidence added to the record it was merged into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contribution {
    /// Seed evidence of a newly created record
    Original,
    /// Widened the time span
    Time,
    /// Added a role
    Role,
    /// Added a location
    Location,
    /// Added nothing new, only corroborated
    Confirmation,
}

/// A single piece of supporting evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Claim that supplied the evidence
    pub claim_id: ClaimId,

    /// Chunk or document identifier
    pub source_id: String,

    /// Independent-source domain
    pub source_domain: String,

    /// Verbatim quote
    pub quote: String,

    /// Evidence category of the quote
    pub evidence_type: EvidenceType,

    /// What the evidence added
    pub contribution: Contribution,
}

/// Every surface form seen across the member claims
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantValues {
    /// Organization-name variants
    pub organizations: BTreeSet<String>,
    /// Role variants
    pub roles: BTreeSet<String>,
    /// Location variants
    pub locations: BTreeSet<String>,
    /// Raw time markers
    pub time_markers: BTreeSet<String>,
}

/// Accumulated provenance of a consolidated record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Contributing claims, in first-seen order, without repeats
    pub source_claim_ids: Vec<ClaimId>,

    /// Distinct source domains
    pub source_domains: BTreeSet<String>,

    /// Surface-form variants
    pub variant_values: VariantValues,

    /// Quotes with source and contribution tags
    pub evidence: Vec<EvidenceRecord>,
}

impl Provenance {
    /// Fold one event claim into this provenance
    pub fn record(&mut self, claim: &EventClaim, contribution: Contribution) {
        if !self.source_claim_ids.contains(&claim.claim_id) {
            self.source_claim_ids.push(claim.claim_id.clone());
        }
        self.source_domains.insert(claim.source_domain.clone());

        let variants = &mut self.variant_values;
        if let Some(org) = &claim.organization {
            variants.organizations.insert(org.clone());
        }
        variants.roles.extend(claim.roles.iter().cloned());
        variants.locations.extend(claim.locations.iter().cloned());
        variants.time_markers.extend(claim.time_markers.iter().cloned());

        self.evidence.push(EvidenceRecord {
            claim_id: claim.claim_id.clone(),
            source_id: claim.source_id.clone(),
            source_domain: claim.source_domain.clone(),
            quote: claim.evidence_quote.clone(),
            evidence_type: claim.evidence_type,
            contribution,
        });
    }

    /// Number of independent (domain-deduplicated) sources
    pub fn source_count(&self) -> usize {
        self.source_domains.len()
    }

    /// All recorded quotes, in arrival order
    pub fn quotes(&self) -> impl Iterator<Item = &str> {
        self.evidence.iter().map(|e| e.quote.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeSpan;

    #[test]
    fn test_record_accumulates_variants() {
        let mut prov = Provenance::default();
        let a = EventClaim::new("a", "doc-1", "worldbank.org")
            .with_organization("World Bank")
            .with_role("Economist")
            .with_time(TimeSpan::range(1990, 1995))
            .with_quote("joined the World Bank as an economist");
        let b = EventClaim::new("b", "doc-2", "wikipedia.org")
            .with_organization("The World Bank Group")
            .with_role("Economist")
            .with_location("Washington");

        prov.record(&a, Contribution::Original);
        prov.record(&b, Contribution::Location);

        assert_eq!(prov.source_claim_ids.len(), 2);
        assert_eq!(prov.source_count(), 2);
        assert_eq!(prov.variant_values.organizations.len(), 2);
        assert_eq!(prov.variant_values.roles.len(), 1);
        assert!(prov.variant_values.locations.contains("Washington"));
        assert_eq!(prov.evidence[1].contribution, Contribution::Location);
        assert_eq!(prov.quotes().next(), Some("joined the World Bank as an economist"));
    }

    #[test]
    fn test_same_domain_counts_once() {
        let mut prov = Provenance::default();
        prov.record(&EventClaim::new("a", "doc-1", "who.int"), Contribution::Original);
        prov.record(&EventClaim::new("b", "doc-2", "who.int"), Contribution::Confirmation);
        assert_eq!(prov.source_count(), 1);
        assert_eq!(prov.evidence.len(), 2);
    }
}
