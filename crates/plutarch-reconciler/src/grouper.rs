//! Temporal candidate grouping
//!
//! Links claim pairs that plausibly describe the same event and returns the
//! connected components as candidate groups.

use crate::metrics::RunMetrics;
use crate::resolver::ResolvedEntities;
use plutarch_domain::{CandidateGroup, CanonicalId, EventClaim, GroupingCriterion, GroupingEdge};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Criteria linking claims `a` and `b`, or `None` when they are not linked
///
/// Rules in priority order: overlap with same org and role; overlap with
/// same org or same role; same org and role with a missing start year.
pub fn link_criteria(
    a: &EventClaim,
    b: &EventClaim,
    entities: &ResolvedEntities,
) -> Option<Vec<GroupingCriterion>> {
    let overlap = a.time.overlaps(&b.time);
    let same_org = same_org(entities.organization_id(a), entities.organization_id(b));
    let same_role = !entities
        .role_ids(a)
        .is_disjoint(&entities.role_ids(b));
    let missing_time = a.time.start.is_none() || b.time.start.is_none();

    let criteria = if overlap && same_org && same_role {
        vec![
            GroupingCriterion::TemporalOverlap,
            GroupingCriterion::SameOrg,
            GroupingCriterion::SameRole,
        ]
    } else if overlap && same_org {
        vec![GroupingCriterion::TemporalOverlap, GroupingCriterion::SameOrg]
    } else if overlap && same_role {
        vec![GroupingCriterion::TemporalOverlap, GroupingCriterion::SameRole]
    } else if same_org && same_role && missing_time {
        vec![
            GroupingCriterion::SameOrg,
            GroupingCriterion::SameRole,
            GroupingCriterion::MissingTime,
        ]
    } else {
        return None;
    };

    Some(criteria)
}

fn same_org(a: Option<&CanonicalId>, b: Option<&CanonicalId>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// Partition claims into candidate groups
///
/// Every pair `(i, j)` with `i < j` is tested; groups are the connected
/// components of the resulting graph. Multi-member groups are coded `G001`,
/// `G002`, ... in order of their lowest member; unlinked claims become
/// singletons coded `S` plus their 1-based claim index. Groups are returned
/// in order of their lowest member index.
pub fn group_candidates(
    claims: &[EventClaim],
    entities: &ResolvedEntities,
    metrics: &mut RunMetrics,
) -> Vec<CandidateGroup> {
    let mut components = DisjointSet::new(claims.len());
    let mut edges = Vec::new();

    for i in 0..claims.len() {
        for j in (i + 1)..claims.len() {
            if let Some(criteria) = link_criteria(&claims[i], &claims[j], entities) {
                debug!("Linked claims {} and {}: {:?}", i, j, criteria);
                components.union(i, j);
                edges.push(GroupingEdge {
                    pair: (i, j),
                    criteria,
                });
            }
        }
    }

    let mut members: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for index in 0..claims.len() {
        members.entry(components.find(index)).or_default().insert(index);
    }

    let mut ordered: Vec<Vec<usize>> = members
        .into_values()
        .map(|set| set.into_iter().collect())
        .collect();
    ordered.sort_by_key(|m: &Vec<usize>| m[0]);

    let mut groups = Vec::with_capacity(ordered.len());
    let mut multi = 0;
    for member_indices in ordered {
        let group_id = if member_indices.len() > 1 {
            multi += 1;
            format!("G{:03}", multi)
        } else {
            format!("S{:03}", member_indices[0] + 1)
        };

        let grouping_criteria = edges
            .iter()
            .filter(|e| member_indices.binary_search(&e.pair.0).is_ok())
            .cloned()
            .collect();

        metrics.record_group(member_indices.len());
        groups.push(CandidateGroup {
            group_id,
            member_claim_ids: member_indices
                .iter()
                .map(|&i| claims[i].claim_id.clone())
                .collect(),
            member_indices,
            grouping_criteria,
        });
    }

    info!(
        "Formed {} candidate groups ({} multi-member) from {} claims",
        groups.len(),
        multi,
        claims.len()
    );

    groups
}

/// Union-find over claim indices
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    // The smaller root wins so roots are always the lowest member
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcilerConfig;
    use crate::resolver::EntityResolver;
    use plutarch_domain::{CanonicalChoice, Canonicalizer, EntityType, TimeSpan};
    use proptest::prelude::*;

    struct FirstVariant;

    impl Canonicalizer for FirstVariant {
        type Error = String;

        fn canonicalize(&self, variants: &[String], _: EntityType) -> Result<CanonicalChoice, String> {
            Ok(CanonicalChoice {
                canonical_name: variants[0].clone(),
                confidence: plutarch_domain::Confidence::High,
                reasoning: String::new(),
            })
        }
    }

    fn claim(id: &str, org: &str, role: &str, time: TimeSpan) -> EventClaim {
        EventClaim::new(id, format!("doc-{}", id), "x.org")
            .with_organization(org)
            .with_role(role)
            .with_time(time)
    }

    fn group(claims: &[EventClaim]) -> Vec<CandidateGroup> {
        let resolver = EntityResolver::new(FirstVariant, &ReconcilerConfig::default());
        let mut metrics = RunMetrics::new();
        let entities = resolver.resolve_claims(claims, &mut metrics);
        group_candidates(claims, &entities, &mut metrics)
    }

    #[test]
    fn test_overlapping_same_org_and_role_group() {
        let claims = vec![
            claim("a", "World Bank", "Economist", TimeSpan::range(1990, 1995)),
            claim("b", "World Bank", "Economist", TimeSpan::range(1992, 1994)),
        ];
        let groups = group(&claims);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_id, "G001");
        assert_eq!(groups[0].member_indices, vec![0, 1]);
        assert_eq!(groups[0].grouping_criteria[0].criteria.len(), 3);
    }

    #[test]
    fn test_disjoint_time_stays_apart() {
        let claims = vec![
            claim("a", "World Bank", "Economist", TimeSpan::range(1980, 1984)),
            claim("b", "World Bank", "Economist", TimeSpan::range(1990, 1995)),
        ];
        let groups = group(&claims);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, "S001");
        assert_eq!(groups[1].group_id, "S002");
        assert!(groups.iter().all(CandidateGroup::is_singleton));
    }

    #[test]
    fn test_missing_time_rule() {
        let claims = vec![
            claim("a", "WHO", "Director-General", TimeSpan::open(2007)),
            claim("b", "WHO", "Director-General", TimeSpan::unknown()),
        ];
        let groups = group(&claims);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].grouping_criteria[0].criteria,
            vec![
                GroupingCriterion::SameOrg,
                GroupingCriterion::SameRole,
                GroupingCriterion::MissingTime
            ]
        );
    }

    #[test]
    fn test_missing_time_needs_both_org_and_role() {
        let claims = vec![
            claim("a", "WHO", "Director-General", TimeSpan::open(2007)),
            claim("b", "WHO", "Consultant", TimeSpan::unknown()),
        ];
        assert_eq!(group(&claims).len(), 2);
    }

    #[test]
    fn test_overlap_with_same_role_only() {
        let claims = vec![
            claim("a", "Harvard", "Professor", TimeSpan::range(2000, 2005)),
            claim("b", "MIT", "Professor", TimeSpan::point(2003)),
        ];
        let groups = group(&claims);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].grouping_criteria[0].criteria,
            vec![GroupingCriterion::TemporalOverlap, GroupingCriterion::SameRole]
        );
    }

    #[test]
    fn test_transitive_components_and_codes() {
        let claims = vec![
            claim("a", "UN", "Envoy", TimeSpan::range(1990, 1992)),
            claim("b", "OECD", "Analyst", TimeSpan::point(1980)),
            claim("c", "UN", "Adviser", TimeSpan::range(1992, 1994)),
            claim("d", "UNICEF", "Adviser", TimeSpan::range(1994, 1996)),
        ];
        let groups = group(&claims);

        // a-c share org and overlap; c-d share role and overlap
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, "G001");
        assert_eq!(groups[0].member_indices, vec![0, 2, 3]);
        assert_eq!(groups[0].grouping_criteria.len(), 2);
        assert_eq!(groups[1].group_id, "S002");
        assert_eq!(groups[1].member_claim_ids[0].as_str(), "b");
    }

    proptest! {
        #[test]
        fn prop_partition_covers_every_claim_once(
            rows in proptest::collection::vec((0usize..3, 0usize..3, proptest::option::of(1990i32..2000)), 0..10)
        ) {
            let orgs = ["UN", "WHO", "OECD"];
            let roles = ["Envoy", "Director", "Analyst"];
            let claims: Vec<EventClaim> = rows
                .iter()
                .enumerate()
                .map(|(i, (o, r, y))| {
                    let time = y.map(TimeSpan::point).unwrap_or_default();
                    claim(&format!("c{}", i), orgs[*o], roles[*r], time)
                })
                .collect();

            let groups = group(&claims);
            let mut seen: Vec<usize> = groups.iter().flat_map(|g| g.member_indices.clone()).collect();
            seen.sort();
            prop_assert_eq!(seen, (0..claims.len()).collect::<Vec<_>>());

            // Identical input gives an identical partition
            prop_assert_eq!(group(&claims), groups);
        }
    }
}
