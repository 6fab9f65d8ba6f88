//! Reconciliation pipeline
//!
//! Chains the resolver, grouper and arbiter over a claim list, and exposes
//! scalar consensus and incremental merge on the same configuration and
//! metrics.

use crate::arbiter::ConsolidationArbiter;
use crate::config::ReconcilerConfig;
use crate::consensus::{compute_consensus, scan_for_consensus, ScanOutcome};
use crate::error::ReconcileError;
use crate::grouper::group_candidates;
use crate::llm::{LlmCanonicalizer, LlmConsolidator, LlmMatchDecider};
use crate::merge::{IncrementalMerger, MergeOutcome};
use crate::metrics::RunMetrics;
use crate::resolver::{EntityResolver, ResolvedEntities};
use crate::rules::{RuleCanonicalizer, RuleConsolidator, RuleMatchDecider};
use crate::timeline::{build_timeline, Timeline};
use plutarch_domain::{
    CandidateGroup, Canonicalizer, Claim, ConsolidatedEvent, Consolidator, EventClaim, Extractor,
    LlmProvider, MatchDecider, ScalarConsensus, SourceChunk,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

/// Output of a batch reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileRun {
    /// Canonical organizations and roles
    pub entities: ResolvedEntities,
    /// Candidate groups, in order of lowest member index
    pub groups: Vec<CandidateGroup>,
    /// Consolidated events in chronological order
    pub timeline: Timeline,
}

/// Reconciliation engine for one person's claims
///
/// # Examples
///
/// ```
/// use plutarch_domain::{EventClaim, TimeSpan};
/// use plutarch_reconciler::{Reconciler, ReconcilerConfig, RuleCanonicalizer};
///
/// let mut reconciler =
///     Reconciler::with_rules(RuleCanonicalizer::new(), ReconcilerConfig::default()).unwrap();
///
/// let claims = vec![
///     EventClaim::new("c1", "doc-1", "a.org")
///         .with_organization("World Bank")
///         .with_role("Economist")
///         .with_time(TimeSpan::range(1990, 1995)),
///     EventClaim::new("c2", "doc-2", "b.org")
///         .with_organization("The World Bank")
///         .with_role("economist")
///         .with_time(TimeSpan::range(1992, 1994)),
/// ];
///
/// let run = reconciler.reconcile(&claims);
/// assert_eq!(run.timeline.events.len(), 1);
/// assert_eq!(run.timeline.events[0].event_code, "G001");
/// ```
pub struct Reconciler<C, K, M> {
    config: ReconcilerConfig,
    resolver: EntityResolver<C>,
    arbiter: ConsolidationArbiter<K>,
    merger: IncrementalMerger<M>,
    metrics: RunMetrics,
}

impl<C, K, M> Reconciler<C, K, M>
where
    C: Canonicalizer,
    C::Error: Display,
    K: Consolidator,
    K::Error: Display,
    M: MatchDecider,
    M::Error: Display,
{
    /// Create a reconciler
    ///
    /// Fails with [`ReconcileError::Config`] when `config` is invalid.
    pub fn new(
        canonicalizer: C,
        consolidator: K,
        decider: M,
        config: ReconcilerConfig,
    ) -> Result<Self, ReconcileError> {
        config.validate().map_err(ReconcileError::Config)?;
        Ok(Self {
            resolver: EntityResolver::new(canonicalizer, &config),
            arbiter: ConsolidationArbiter::new(consolidator),
            merger: IncrementalMerger::new(decider),
            metrics: RunMetrics::new(),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Metrics accumulated since creation or the last reset
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Resolve, group and arbitrate a batch of claims into a timeline
    ///
    /// Never fails: capability errors become low-confidence fallbacks.
    pub fn reconcile(&mut self, claims: &[EventClaim]) -> ReconcileRun {
        info!("Reconciling {} claims", claims.len());

        let entities = self.resolver.resolve_claims(claims, &mut self.metrics);
        let groups = group_candidates(claims, &entities, &mut self.metrics);
        let events = self
            .arbiter
            .arbitrate(claims, &groups, &entities, &mut self.metrics);
        let timeline = build_timeline(events);

        info!(
            "Reconciled {} claims into {} events ({} merged, {} singletons)",
            claims.len(),
            timeline.summary.total_events,
            timeline.summary.merged,
            timeline.summary.singletons
        );

        ReconcileRun {
            entities,
            groups,
            timeline,
        }
    }

    /// Scalar consensus for `attribute` over pre-extracted claims
    pub fn consensus(&mut self, attribute: &str, claims: &[Claim]) -> ScalarConsensus {
        let consensus = compute_consensus(attribute, claims, self.config.quorum);
        self.metrics.record_consensus(consensus.status);
        consensus
    }

    /// Scalar consensus for `attribute`, extracting chunks until decisive
    pub fn scan<E>(&mut self, extractor: &E, chunks: &[SourceChunk], attribute: &str) -> ScanOutcome
    where
        E: Extractor,
        E::Error: Display,
    {
        let outcome = scan_for_consensus(extractor, chunks, attribute, &self.config);
        self.metrics.record_consensus(outcome.consensus.status);
        outcome
    }

    /// Merge new claims into an existing event pool, in order
    pub fn merge(
        &mut self,
        events: &mut Vec<ConsolidatedEvent>,
        claims: &[EventClaim],
    ) -> Vec<MergeOutcome> {
        self.merger.merge_all(events, claims, &mut self.metrics)
    }
}

impl Reconciler<RuleCanonicalizer, RuleConsolidator, RuleMatchDecider> {
    /// Offline reconciler using the alias table and similarity rules
    pub fn with_rules(
        aliases: RuleCanonicalizer,
        config: ReconcilerConfig,
    ) -> Result<Self, ReconcileError> {
        let consolidator = RuleConsolidator::new(config.fuzzy_threshold);
        let decider = RuleMatchDecider::new(config.fuzzy_threshold);
        Self::new(aliases, consolidator, decider, config)
    }
}

impl<L> Reconciler<LlmCanonicalizer<L>, LlmConsolidator<L>, LlmMatchDecider<L>>
where
    L: LlmProvider,
    L::Error: Display,
{
    /// Reconciler asking one LLM provider for every judgement
    pub fn with_llm(llm: Arc<L>, config: ReconcilerConfig) -> Result<Self, ReconcileError> {
        Self::new(
            LlmCanonicalizer::new(Arc::clone(&llm)),
            LlmConsolidator::new(Arc::clone(&llm)),
            LlmMatchDecider::new(llm),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plutarch_domain::{ClaimValue, ConsensusStatus, Decision, EvidenceType, TimeSpan};

    fn rules() -> Reconciler<RuleCanonicalizer, RuleConsolidator, RuleMatchDecider> {
        Reconciler::with_rules(RuleCanonicalizer::new(), ReconcilerConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = ReconcilerConfig {
            quorum: 0,
            ..Default::default()
        };
        let result = Reconciler::with_rules(RuleCanonicalizer::new(), config);
        assert!(matches!(result, Err(ReconcileError::Config(_))));
    }

    #[test]
    fn test_empty_input() {
        let run = rules().reconcile(&[]);
        assert!(run.groups.is_empty());
        assert!(run.timeline.events.is_empty());
        assert!(run.entities.organizations.is_empty());
    }

    #[test]
    fn test_reconcile_records_metrics() {
        let mut reconciler = rules();
        let claims = vec![
            EventClaim::new("c1", "d1", "a.org")
                .with_organization("Harvard")
                .with_time(TimeSpan::point(2000)),
            EventClaim::new("c2", "d2", "b.org")
                .with_organization("MIT")
                .with_time(TimeSpan::point(2010)),
        ];
        let run = reconciler.reconcile(&claims);

        assert_eq!(run.timeline.events.len(), 2);
        assert_eq!(reconciler.metrics().decision_count(Decision::Singleton), 2);

        reconciler.reset_metrics();
        assert_eq!(reconciler.metrics().decision_count(Decision::Singleton), 0);
    }

    #[test]
    fn test_consensus_uses_configured_quorum() {
        let mut reconciler = rules();
        let claims = vec![
            Claim::scalar("f1", "a.org", Some(ClaimValue::Year(1947)), EvidenceType::Narrative),
            Claim::scalar("f2", "b.org", Some(ClaimValue::Year(1947)), EvidenceType::Narrative),
        ];
        let consensus = reconciler.consensus("birth_year", &claims);
        assert_eq!(consensus.status, ConsensusStatus::Verified);
    }

    #[test]
    fn test_merge_into_reconciled_timeline() {
        let mut reconciler = rules();
        let run = reconciler.reconcile(&[EventClaim::new("c1", "d1", "who.int")
            .with_organization("WHO")
            .with_role("Director-General")
            .with_time(TimeSpan::open(2007))]);

        let mut events = run.timeline.events;
        let outcomes = reconciler.merge(
            &mut events,
            &[EventClaim::new("c2", "d2", "news.org")
                .with_organization("WHO")
                .with_location("Geneva")
                .with_time(TimeSpan::range(2007, 2017))],
        );

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].event_code, "S001");
        assert_eq!(events.len(), 1);
        assert!(events[0].locations.contains("Geneva"));
    }
}
