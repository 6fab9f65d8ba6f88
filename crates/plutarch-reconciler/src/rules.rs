//! Deterministic rule-based capabilities
//!
//! Offline counterparts of the LLM adapters: an alias table for
//! canonicalization and similarity/time heuristics for consolidation and
//! match decisions.

use crate::error::ReconcileError;
use crate::similarity::similarity;
use plutarch_domain::{
    CanonicalChoice, Canonicalizer, Confidence, ConsolidationVerdict, Consolidator, EntityType,
    EventClaim, EventSummary, MatchDecider, MatchDecision, MatchVerdict, TimeSpan,
    VerdictDecision,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonicalizer backed by an alias table
///
/// # Examples
///
/// ```
/// use plutarch_domain::{Canonicalizer, EntityType};
/// use plutarch_reconciler::RuleCanonicalizer;
///
/// let rules = RuleCanonicalizer::new().with_alias("IBRD", "World Bank");
/// let variants = vec!["IBRD".to_string(), "The World Bank".to_string()];
/// let choice = rules.canonicalize(&variants, EntityType::Organization).unwrap();
/// assert_eq!(choice.canonical_name, "World Bank");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct RuleCanonicalizer {
    /// Canonical name to aliases, spelled as configured
    table: BTreeMap<String, Vec<String>>,

    /// Lowercased alias or canonical name to canonical name
    lookup: BTreeMap<String, String>,
}

impl From<BTreeMap<String, Vec<String>>> for RuleCanonicalizer {
    fn from(table: BTreeMap<String, Vec<String>>) -> Self {
        let mut rules = Self::new();
        for (canonical, aliases) in table {
            rules.add_canonical(&canonical);
            for alias in aliases {
                rules = rules.with_alias(alias, canonical.clone());
            }
        }
        rules
    }
}

impl From<RuleCanonicalizer> for BTreeMap<String, Vec<String>> {
    fn from(rules: RuleCanonicalizer) -> Self {
        rules.table
    }
}

impl RuleCanonicalizer {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `alias` (case-insensitive) to `canonical`
    ///
    /// The canonical name always matches itself.
    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        let alias = alias.into().trim().to_string();
        let canonical = canonical.into();
        self.add_canonical(&canonical);

        let key = alias.to_lowercase();
        if key == canonical.to_lowercase() {
            return self;
        }
        if let Some(previous) = self.lookup.insert(key.clone(), canonical.clone()) {
            if let Some(aliases) = self.table.get_mut(&previous) {
                aliases.retain(|a| a.to_lowercase() != key);
            }
        }
        if let Some(aliases) = self.table.get_mut(&canonical) {
            aliases.push(alias);
        }
        self
    }

    fn add_canonical(&mut self, canonical: &str) {
        self.table.entry(canonical.to_string()).or_default();
        self.lookup
            .insert(canonical.trim().to_lowercase(), canonical.to_string());
    }

    /// Number of names known, canonical names included
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl Canonicalizer for RuleCanonicalizer {
    type Error = ReconcileError;

    fn canonicalize(
        &self,
        variants: &[String],
        entity_type: EntityType,
    ) -> Result<CanonicalChoice, Self::Error> {
        variants
            .iter()
            .find_map(|v| {
                self.lookup
                    .get(&v.trim().to_lowercase())
                    .map(|canonical| (v, canonical))
            })
            .map(|(variant, canonical)| CanonicalChoice {
                canonical_name: canonical.clone(),
                confidence: Confidence::High,
                reasoning: format!("alias table maps '{}' to '{}'", variant, canonical),
            })
            .ok_or_else(|| {
                ReconcileError::NoRule(format!("no {} alias for {:?}", entity_type, variants))
            })
    }
}

/// Whether two spans can describe the same stint; open ends run forever
fn compatible(a: &TimeSpan, b: &TimeSpan) -> bool {
    match (a.start, b.start) {
        (Some(sa), Some(sb)) => {
            let ea = a.end.unwrap_or(i32::MAX);
            let eb = b.end.unwrap_or(i32::MAX);
            sa <= eb && sb <= ea
        }
        _ => true,
    }
}

fn same_name(a: Option<&str>, b: Option<&str>, threshold: u8) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => similarity(a, b) >= threshold,
        _ => false,
    }
}

/// Consolidator judging a group by organization similarity and time
///
/// Same event when every pair of members names a similar organization and
/// has compatible spans; otherwise different events.
#[derive(Debug, Clone, Copy)]
pub struct RuleConsolidator {
    threshold: u8,
}

impl RuleConsolidator {
    /// Create with an organization similarity threshold (0-100)
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl Consolidator for RuleConsolidator {
    type Error = ReconcileError;

    fn consolidate(&self, group: &[EventClaim]) -> Result<ConsolidationVerdict, Self::Error> {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                let reason = if a.kind != b.kind {
                    Some("different event kinds")
                } else if !same_name(a.organization.as_deref(), b.organization.as_deref(), self.threshold) {
                    Some("organizations differ or are missing")
                } else if !compatible(&a.time, &b.time) {
                    Some("time spans are incompatible")
                } else {
                    None
                };

                if let Some(reason) = reason {
                    return Ok(ConsolidationVerdict {
                        decision: VerdictDecision::DifferentEvents,
                        fields: Default::default(),
                        reasoning: format!("{} vs {}: {}", a.claim_id, b.claim_id, reason),
                        confidence: Some(Confidence::Medium),
                    });
                }
            }
        }

        Ok(ConsolidationVerdict {
            decision: VerdictDecision::SameEvent,
            fields: Default::default(),
            reasoning: "same organization with compatible time spans".to_string(),
            confidence: Some(Confidence::Medium),
        })
    }
}

/// Match decider picking the first compatible active event
#[derive(Debug, Clone, Copy)]
pub struct RuleMatchDecider {
    threshold: u8,
}

impl RuleMatchDecider {
    /// Create with an organization similarity threshold (0-100)
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl MatchDecider for RuleMatchDecider {
    type Error = ReconcileError;

    fn decide(
        &self,
        candidate: &EventClaim,
        existing: &[EventSummary],
    ) -> Result<MatchVerdict, Self::Error> {
        let target = existing.iter().find(|e| {
            e.kind == candidate.kind
                && same_name(
                    e.organization.as_deref(),
                    candidate.organization.as_deref(),
                    self.threshold,
                )
                && compatible(&e.time, &candidate.time)
        });

        Ok(match target {
            Some(event) => MatchVerdict {
                decision: MatchDecision::Merge,
                target_event_code: Some(event.event_code.clone()),
                reasoning: format!(
                    "same organization as {} with compatible time span",
                    event.event_code
                ),
                confidence: Confidence::Medium,
            },
            None => MatchVerdict {
                decision: MatchDecision::New,
                target_event_code: None,
                reasoning: "no existing event with a matching organization and time".to_string(),
                confidence: Confidence::Medium,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plutarch_domain::EventKind;

    #[test]
    fn test_alias_table_is_case_insensitive() {
        let rules = RuleCanonicalizer::new().with_alias("who", "World Health Organization");
        let choice = rules
            .canonicalize(&["WHO".to_string()], EntityType::Organization)
            .unwrap();
        assert_eq!(choice.canonical_name, "World Health Organization");
    }

    #[test]
    fn test_unknown_variants_have_no_rule() {
        let rules = RuleCanonicalizer::new().with_alias("IBRD", "World Bank");
        let result = rules.canonicalize(&["UNICEF".to_string()], EntityType::Organization);
        assert!(matches!(result, Err(ReconcileError::NoRule(_))));
    }

    #[test]
    fn test_table_from_toml() {
        let rules: RuleCanonicalizer = toml::from_str(
            r#"
            "World Bank" = ["IBRD", "The World Bank Group"]
            "#,
        )
        .unwrap();
        assert_eq!(rules.len(), 3);
        let choice = rules
            .canonicalize(&["the world bank group".to_string()], EntityType::Organization)
            .unwrap();
        assert_eq!(choice.canonical_name, "World Bank");
    }

    #[test]
    fn test_table_serializes_as_configured() {
        let rules: RuleCanonicalizer = toml::from_str(
            r#"
            "World Bank" = ["IBRD", "The World Bank Group"]
            "WHO" = []
            "#,
        )
        .unwrap();
        let table: BTreeMap<String, Vec<String>> = rules.clone().into();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table["World Bank"],
            vec!["IBRD".to_string(), "The World Bank Group".to_string()]
        );
        assert!(table["WHO"].is_empty());

        let reparsed: RuleCanonicalizer = toml::from_str(&toml::to_string(&rules).unwrap()).unwrap();
        assert_eq!(reparsed, rules);
    }

    #[test]
    fn test_canonical_name_matches_itself() {
        let rules = RuleCanonicalizer::new().with_alias("IBRD", "World Bank");
        let choice = rules
            .canonicalize(&["WORLD BANK".to_string()], EntityType::Organization)
            .unwrap();
        assert_eq!(choice.canonical_name, "World Bank");
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_remapped_alias_moves_between_entries() {
        let rules = RuleCanonicalizer::new()
            .with_alias("Bank", "World Bank")
            .with_alias("bank", "Bank of England");
        let table: BTreeMap<String, Vec<String>> = rules.clone().into();
        assert!(table["World Bank"].is_empty());
        assert_eq!(table["Bank of England"], vec!["bank".to_string()]);
    }

    fn claim(id: &str, org: &str, time: TimeSpan) -> EventClaim {
        EventClaim::new(id, "d", "x.org").with_organization(org).with_time(time)
    }

    #[test]
    fn test_consolidator_same_org_overlapping() {
        let verdict = RuleConsolidator::new(85)
            .consolidate(&[
                claim("a", "World Bank", TimeSpan::range(1990, 1995)),
                claim("b", "The World Bank Group", TimeSpan::range(1992, 1994)),
                claim("c", "World Bank", TimeSpan::unknown()),
            ])
            .unwrap();
        assert_eq!(verdict.decision, VerdictDecision::SameEvent);
    }

    #[test]
    fn test_consolidator_splits_on_org() {
        let verdict = RuleConsolidator::new(85)
            .consolidate(&[
                claim("a", "Harvard", TimeSpan::range(2000, 2005)),
                claim("b", "MIT", TimeSpan::point(2003)),
            ])
            .unwrap();
        assert_eq!(verdict.decision, VerdictDecision::DifferentEvents);
        assert!(verdict.reasoning.contains("a vs b"));
    }

    #[test]
    fn test_consolidator_splits_on_kind() {
        let award = claim("b", "WHO", TimeSpan::point(2010)).with_kind(EventKind::Award);
        let verdict = RuleConsolidator::new(85)
            .consolidate(&[claim("a", "WHO", TimeSpan::open(2007)), award])
            .unwrap();
        assert_eq!(verdict.decision, VerdictDecision::DifferentEvents);
    }

    fn summary(code: &str, org: &str, time: TimeSpan) -> EventSummary {
        EventSummary {
            event_code: code.to_string(),
            kind: EventKind::CareerPosition,
            organization: Some(org.to_string()),
            time,
            roles: Vec::new(),
            locations: Vec::new(),
        }
    }

    #[test]
    fn test_decider_merges_into_open_ended_event() {
        let verdict = RuleMatchDecider::new(85)
            .decide(
                &claim("c", "WHO", TimeSpan::range(2007, 2017)),
                &[
                    summary("S001", "UN", TimeSpan::open(2000)),
                    summary("S002", "WHO", TimeSpan::open(2007)),
                ],
            )
            .unwrap();
        assert_eq!(verdict.decision, MatchDecision::Merge);
        assert_eq!(verdict.target_event_code.as_deref(), Some("S002"));
    }

    #[test]
    fn test_decider_new_when_time_disjoint() {
        let verdict = RuleMatchDecider::new(85)
            .decide(
                &claim("c", "WHO", TimeSpan::range(1980, 1985)),
                &[summary("S001", "WHO", TimeSpan::range(2007, 2017))],
            )
            .unwrap();
        assert_eq!(verdict.decision, MatchDecision::New);
    }
}
