//! Plutarch Domain Layer
//!
//! This crate contains the data model for reconciling noisy, redundant claims
//! about one person's life into consolidated, provenance-tracked facts. It
//! defines the value objects, closed decision vocabularies, and capability
//! traits that every other Plutarch crate depends upon.
//!
//! ## Key Concepts
//!
//! - **Claim**: one extracted, possibly wrong assertion from one source
//! - **Canonical entity**: a deduplicated organization or role with aliases
//! - **Candidate group**: claims hypothesized to describe one real event
//! - **Consolidated event**: the durable output record for a career/award fact
//! - **Scalar consensus**: quorum vote over a single-valued fact (birth year)
//!
//! ## Architecture
//!
//! - No I/O; every record is plain serde data
//! - Closed enums for decisions, statuses and attribute types
//! - External capabilities (LLM, extractor, canonicalizer, consolidator,
//!   match decider) are traits implemented in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim;
pub mod confidence;
pub mod consensus;
pub mod entity;
pub mod event;
pub mod provenance;
pub mod time;
pub mod traits;

// Re-exports for convenience
pub use claim::{AttributeType, Claim, ClaimId, ClaimValue, EventClaim, EventKind, EvidenceType};
pub use confidence::Confidence;
pub use consensus::{ConsensusStatus, ScalarConsensus, SupportingClaim, ValueLedger};
pub use entity::{CanonicalEntity, CanonicalId, EntityMap, EntityType};
pub use event::{
    CandidateGroup, ConsolidatedEvent, Decision, EventId, EventSummary, GroupingCriterion,
    GroupingEdge, ReviewStatus,
};
pub use provenance::{Contribution, EvidenceRecord, Provenance, VariantValues};
pub use time::TimeSpan;
pub use traits::{
    CanonicalChoice, Canonicalizer, ChunkClaims, ConsolidatedFields, ConsolidationVerdict,
    Consolidator, Extractor, LlmProvider, MatchDecider, MatchDecision, MatchVerdict, SourceChunk,
    VerdictDecision,
};
