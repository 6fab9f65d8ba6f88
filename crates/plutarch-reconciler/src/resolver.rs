//! Canonical entity resolution
//!
//! Mentions are sorted, clustered greedily by token similarity to each
//! cluster's seed, and named by a [`Canonicalizer`]. Every mention lands in
//! exactly one cluster; a failing canonicalizer only lowers confidence.

use crate::config::ReconcilerConfig;
use crate::metrics::{FallbackStage, RunMetrics};
use crate::similarity::similarity;
use plutarch_domain::{
    CanonicalEntity, CanonicalId, Canonicalizer, Confidence, EntityMap, EntityType, EventClaim,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Mention string mapped to the indices of the claims that contain it
pub type Mentions = BTreeMap<String, BTreeSet<usize>>;

/// Collect the organization or role mentions of a claim list
///
/// Mentions are trimmed; blank ones are ignored.
pub fn collect_mentions(claims: &[EventClaim], entity_type: EntityType) -> Mentions {
    let mut mentions = Mentions::new();
    for (index, claim) in claims.iter().enumerate() {
        let names: Vec<&String> = match entity_type {
            EntityType::Organization => claim.organization.iter().collect(),
            EntityType::Role => claim.roles.iter().collect(),
        };
        for name in names {
            let name = name.trim();
            if !name.is_empty() {
                mentions.entry(name.to_string()).or_default().insert(index);
            }
        }
    }
    mentions
}

/// Greedy single-pass clustering of mentions
///
/// Input is deduplicated and sorted first, so the result does not depend on
/// input order. Each unassigned mention seeds a cluster and absorbs every
/// later unassigned mention scoring at least `threshold` against the seed.
///
/// # Examples
///
/// ```
/// use plutarch_reconciler::cluster_mentions;
///
/// let clusters = cluster_mentions(["The World Bank Group", "WHO", "World Bank"], 85);
/// assert_eq!(clusters, vec![
///     vec!["The World Bank Group".to_string(), "World Bank".to_string()],
///     vec!["WHO".to_string()],
/// ]);
/// ```
pub fn cluster_mentions<'a>(
    mentions: impl IntoIterator<Item = &'a str>,
    threshold: u8,
) -> Vec<Vec<String>> {
    let sorted: BTreeSet<&str> = mentions.into_iter().collect();
    let sorted: Vec<&str> = sorted.into_iter().collect();
    let mut assigned = vec![false; sorted.len()];
    let mut clusters = Vec::new();

    for i in 0..sorted.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let seed = sorted[i];
        let mut cluster = vec![seed.to_string()];

        for j in (i + 1)..sorted.len() {
            if !assigned[j] && similarity(seed, sorted[j]) >= threshold {
                assigned[j] = true;
                cluster.push(sorted[j].to_string());
            }
        }
        clusters.push(cluster);
    }

    clusters
}

/// Organization and role maps for one person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntities {
    /// Canonical organizations
    pub organizations: EntityMap,
    /// Canonical roles
    pub roles: EntityMap,
}

impl Default for ResolvedEntities {
    fn default() -> Self {
        Self {
            organizations: EntityMap::new(EntityType::Organization),
            roles: EntityMap::new(EntityType::Role),
        }
    }
}

impl ResolvedEntities {
    /// Canonical organization of a claim
    pub fn organization_id(&self, claim: &EventClaim) -> Option<&CanonicalId> {
        claim
            .organization
            .as_deref()
            .and_then(|org| self.organizations.canonical_id(org.trim()))
    }

    /// Canonical roles of a claim
    pub fn role_ids(&self, claim: &EventClaim) -> BTreeSet<&CanonicalId> {
        claim
            .roles
            .iter()
            .filter_map(|role| self.roles.canonical_id(role.trim()))
            .collect()
    }

    /// Display name of a claim's organization, canonical when resolved
    pub fn organization_name(&self, claim: &EventClaim) -> Option<String> {
        let org = claim.organization.as_deref()?.trim();
        if org.is_empty() {
            return None;
        }
        Some(
            self.organizations
                .resolve(org)
                .map(|e| e.canonical_name.clone())
                .unwrap_or_else(|| org.to_string()),
        )
    }

    /// Display names of a claim's roles, canonical when resolved
    pub fn role_names(&self, claim: &EventClaim) -> BTreeSet<String> {
        claim
            .roles
            .iter()
            .map(|role| role.trim())
            .filter(|role| !role.is_empty())
            .map(|role| {
                self.roles
                    .resolve(role)
                    .map(|e| e.canonical_name.clone())
                    .unwrap_or_else(|| role.to_string())
            })
            .collect()
    }
}

/// Resolves organization and role mentions into canonical entities
pub struct EntityResolver<C> {
    canonicalizer: C,
    org_threshold: u8,
    role_threshold: u8,
}

impl<C> EntityResolver<C>
where
    C: Canonicalizer,
    C::Error: Display,
{
    /// Create a resolver using the thresholds in `config`
    pub fn new(canonicalizer: C, config: &ReconcilerConfig) -> Self {
        Self {
            canonicalizer,
            org_threshold: config.fuzzy_threshold,
            role_threshold: config.role_fuzzy_threshold,
        }
    }

    /// The canonicalizer in use
    pub fn canonicalizer(&self) -> &C {
        &self.canonicalizer
    }

    /// Resolve organizations and roles of a claim list
    pub fn resolve_claims(&self, claims: &[EventClaim], metrics: &mut RunMetrics) -> ResolvedEntities {
        ResolvedEntities {
            organizations: self.resolve(
                EntityType::Organization,
                &collect_mentions(claims, EntityType::Organization),
                metrics,
            ),
            roles: self.resolve(
                EntityType::Role,
                &collect_mentions(claims, EntityType::Role),
                metrics,
            ),
        }
    }

    /// Resolve one entity type
    ///
    /// Canonical ids are numbered in cluster order (`org_001`, `org_002`, ...).
    pub fn resolve(
        &self,
        entity_type: EntityType,
        mentions: &Mentions,
        metrics: &mut RunMetrics,
    ) -> EntityMap {
        let threshold = match entity_type {
            EntityType::Organization => self.org_threshold,
            EntityType::Role => self.role_threshold,
        };

        let clusters = cluster_mentions(mentions.keys().map(String::as_str), threshold);
        info!(
            "Clustered {} {} mentions into {} clusters (threshold {})",
            mentions.len(),
            entity_type,
            clusters.len(),
            threshold
        );
        metrics.record_clustering(entity_type, mentions.len(), clusters.len());

        let mut map = EntityMap::new(entity_type);
        for (position, cluster) in clusters.into_iter().enumerate() {
            let (canonical_name, confidence, reasoning) =
                self.name_cluster(&cluster, entity_type, metrics);

            let member_claim_indices = cluster
                .iter()
                .filter_map(|alias| mentions.get(alias))
                .flatten()
                .copied()
                .collect();

            let entity = CanonicalEntity {
                canonical_id: CanonicalId::numbered(entity_type, position + 1),
                canonical_name,
                entity_type,
                aliases: cluster.into_iter().collect(),
                member_claim_indices,
                confidence,
                reasoning,
            };
            debug!(
                "{} -> {} ({} aliases)",
                entity.canonical_id,
                entity.canonical_name,
                entity.aliases.len()
            );
            map.insert(entity);
        }

        map
    }

    fn name_cluster(
        &self,
        cluster: &[String],
        entity_type: EntityType,
        metrics: &mut RunMetrics,
    ) -> (String, Confidence, String) {
        // Clusters are never empty
        let first = cluster[0].clone();
        if cluster.len() == 1 {
            return (first, Confidence::High, "single variant".to_string());
        }

        match self.canonicalizer.canonicalize(cluster, entity_type) {
            Ok(choice) if !choice.canonical_name.trim().is_empty() => (
                choice.canonical_name.trim().to_string(),
                choice.confidence,
                choice.reasoning,
            ),
            Ok(_) => {
                warn!("Canonicalizer returned an empty name for {:?}", cluster);
                metrics.record_fallback(FallbackStage::Canonicalize);
                (
                    first,
                    Confidence::Low,
                    "canonicalizer returned no name, using first variant".to_string(),
                )
            }
            Err(e) => {
                warn!("Canonicalization failed for {:?}: {}", cluster, e);
                metrics.record_fallback(FallbackStage::Canonicalize);
                (
                    first,
                    Confidence::Low,
                    format!("canonicalization failed, using first variant: {}", e),
                )
            }
        }
    }
}
