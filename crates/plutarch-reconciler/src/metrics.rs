//! Metrics collection for reconciliation runs

use plutarch_domain::{ConsensusStatus, Decision, EntityType};
use std::collections::HashMap;
use std::fmt;

/// Capability call that fell back to its documented default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackStage {
    /// Canonicalizer failed; first variant used
    Canonicalize,
    /// Consolidator failed; group kept as different events
    Consolidate,
    /// Match decider failed or named an unknown event; new event created
    MatchDecision,
}

impl fmt::Display for FallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonicalize => write!(f, "canonicalize"),
            Self::Consolidate => write!(f, "consolidate"),
            Self::MatchDecision => write!(f, "match_decision"),
        }
    }
}

/// Metrics collected during one reconciliation run
///
/// Tracks clustering, grouping, decisions by kind, fallbacks taken, and
/// incremental merges versus creations.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    /// Distinct mentions seen per entity type
    pub mentions: HashMap<EntityType, usize>,

    /// Clusters formed per entity type
    pub clusters: HashMap<EntityType, usize>,

    /// Candidate groups formed
    pub groups_formed: usize,

    /// Candidate groups with more than one member
    pub multi_member_groups: usize,

    /// Arbiter decisions by kind
    pub decisions: HashMap<Decision, usize>,

    /// Fallbacks taken per stage
    pub fallbacks: HashMap<FallbackStage, usize>,

    /// Claims merged into existing events
    pub merges: usize,

    /// Events created by the merge engine
    pub creations: usize,

    /// Scalar consensus outcomes by status
    pub consensus: HashMap<ConsensusStatus, usize>,
}

impl RunMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of clustering one entity type
    pub fn record_clustering(&mut self, entity_type: EntityType, mentions: usize, clusters: usize) {
        *self.mentions.entry(entity_type).or_insert(0) += mentions;
        *self.clusters.entry(entity_type).or_insert(0) += clusters;
    }

    /// Record a candidate group of `size` members
    pub fn record_group(&mut self, size: usize) {
        self.groups_formed += 1;
        if size > 1 {
            self.multi_member_groups += 1;
        }
    }

    /// Record an arbiter decision
    pub fn record_decision(&mut self, decision: Decision) {
        *self.decisions.entry(decision).or_insert(0) += 1;
    }

    /// Record a fallback
    pub fn record_fallback(&mut self, stage: FallbackStage) {
        *self.fallbacks.entry(stage).or_insert(0) += 1;
    }

    /// Record a merge into an existing event
    pub fn record_merge(&mut self) {
        self.merges += 1;
    }

    /// Record creation of a new event
    pub fn record_creation(&mut self) {
        self.creations += 1;
    }

    /// Record a scalar consensus outcome
    pub fn record_consensus(&mut self, status: ConsensusStatus) {
        *self.consensus.entry(status).or_insert(0) += 1;
    }

    /// Count of a given decision
    pub fn decision_count(&self, decision: Decision) -> usize {
        self.decisions.get(&decision).copied().unwrap_or(0)
    }

    /// Count of fallbacks at a given stage
    pub fn fallback_count(&self, stage: FallbackStage) -> usize {
        self.fallbacks.get(&stage).copied().unwrap_or(0)
    }

    /// Total fallbacks across all stages
    pub fn total_fallbacks(&self) -> usize {
        self.fallbacks.values().sum()
    }

    /// Total clusters across entity types
    pub fn total_clusters(&self) -> usize {
        self.clusters.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Reconciliation Metrics Summary".to_string(),
            "==============================".to_string(),
        ];

        for entity_type in [EntityType::Organization, EntityType::Role] {
            if let Some(mentions) = self.mentions.get(&entity_type) {
                lines.push(format!(
                    "{} mentions: {} in {} clusters",
                    entity_type,
                    mentions,
                    self.clusters.get(&entity_type).copied().unwrap_or(0)
                ));
            }
        }

        lines.push(format!(
            "Candidate groups: {} ({} multi-member)",
            self.groups_formed, self.multi_member_groups
        ));

        if !self.decisions.is_empty() {
            lines.push(String::new());
            lines.push("Decisions:".to_string());
            let mut decisions: Vec<_> = self.decisions.iter().collect();
            decisions.sort_by_key(|(d, _)| d.as_str());
            for (decision, count) in decisions {
                lines.push(format!("  {}: {}", decision, count));
            }
        }

        if self.merges + self.creations > 0 {
            lines.push(String::new());
            lines.push(format!(
                "Incremental: {} merged, {} created",
                self.merges, self.creations
            ));
        }

        if !self.consensus.is_empty() {
            lines.push(String::new());
            lines.push("Scalar consensus:".to_string());
            let mut statuses: Vec<_> = self.consensus.iter().collect();
            statuses.sort_by_key(|(s, _)| s.as_str());
            for (status, count) in statuses {
                lines.push(format!("  {}: {}", status, count));
            }
        }

        if !self.fallbacks.is_empty() {
            lines.push(String::new());
            lines.push("Fallbacks:".to_string());
            let mut fallbacks: Vec<_> = self.fallbacks.iter().collect();
            fallbacks.sort_by_key(|(s, _)| s.to_string());
            for (stage, count) in fallbacks {
                lines.push(format!("  {}: {}", stage, count));
            }
            lines.push(format!("  Total: {}", self.total_fallbacks()));
        }

        lines.join("\n")
    }
}
