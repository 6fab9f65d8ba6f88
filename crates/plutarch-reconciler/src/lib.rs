//! Plutarch Reconciler
//!
//! Turns noisy per-source claims about one person into a consistent,
//! provenance-tracked record.
//!
//! # Architecture
//!
//! ```text
//! EventClaims → EntityResolver → group_candidates → ConsolidationArbiter → Timeline
//!                                                        ↑
//! new EventClaims ─────────────────────────→ IncrementalMerger
//!
//! scalar Claims → ConsensusTracker → ScalarConsensus
//! ```
//!
//! Every judgement (canonical names, same-event verdicts, merge targets) is
//! delegated to a capability trait from `plutarch-domain`. Two families are
//! provided: LLM-backed adapters ([`LlmCanonicalizer`], [`LlmConsolidator`],
//! [`LlmMatchDecider`]) and deterministic rules ([`RuleCanonicalizer`],
//! [`RuleConsolidator`], [`RuleMatchDecider`]). A failing capability never
//! aborts a run; the calling component falls back and lowers confidence.
//!
//! # Example Usage
//!
//! ```
//! use plutarch_domain::{Claim, ClaimValue, ConsensusStatus, EvidenceType};
//! use plutarch_reconciler::{Reconciler, ReconcilerConfig, RuleCanonicalizer};
//!
//! let mut reconciler =
//!     Reconciler::with_rules(RuleCanonicalizer::new(), ReconcilerConfig::default()).unwrap();
//!
//! let claims = vec![
//!     Claim::scalar("c1", "a.org", Some(ClaimValue::Year(1950)), EvidenceType::Narrative),
//!     Claim::scalar("c2", "b.org", Some(ClaimValue::Year(1950)), EvidenceType::ExplicitField),
//! ];
//! let consensus = reconciler.consensus("birth_year", &claims);
//! assert_eq!(consensus.status, ConsensusStatus::Verified);
//! ```

#![warn(missing_docs)]

mod arbiter;
mod config;
mod consensus;
mod error;
mod grouper;
mod llm;
mod merge;
mod metrics;
mod pipeline;
mod resolver;
mod rules;
mod similarity;
mod timeline;

pub use arbiter::{accumulate_provenance, ConsolidationArbiter};
pub use config::ReconcilerConfig;
pub use consensus::{
    compute_consensus, narrative, scan_for_consensus, ConsensusTracker, ScanFailure, ScanOutcome,
};
pub use error::ReconcileError;
pub use grouper::{group_candidates, link_criteria};
pub use llm::{format_claim, LlmCanonicalizer, LlmConsolidator, LlmMatchDecider};
pub use merge::{enrich, extend_span, IncrementalMerger, MergeOutcome};
pub use metrics::{FallbackStage, RunMetrics};
pub use pipeline::{ReconcileRun, Reconciler};
pub use resolver::{cluster_mentions, collect_mentions, EntityResolver, Mentions, ResolvedEntities};
pub use rules::{RuleCanonicalizer, RuleConsolidator, RuleMatchDecider};
pub use similarity::similarity;
pub use timeline::{build_timeline, sort_events, summarize, Timeline, TimelineSummary};
