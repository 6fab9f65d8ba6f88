//! Trait definitions for external capabilities
//!
//! These traits define the boundaries between reconciliation logic and the
//! collaborators it consumes. Every capability may fail or return nonsense;
//! callers in the reconciler turn failures into documented fallbacks.

use crate::{Claim, Confidence, EntityType, EventClaim, EventSummary, TimeSpan};
use serde::{Deserialize, Serialize};

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (plutarch-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate with structured output (if supported)
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}

/// A unit of source text handed to an extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    /// Chunk or document identifier
    pub source_id: String,

    /// Domain used for independent-source counting
    pub source_domain: String,

    /// Text to extract from
    pub text: String,
}

/// Claims extracted from one chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkClaims {
    /// Chunk the claims came from
    pub source_id: String,

    /// Career positions and awards
    #[serde(default)]
    pub events: Vec<EventClaim>,

    /// Single-valued facts
    #[serde(default)]
    pub facts: Vec<Claim>,
}

impl ChunkClaims {
    /// Empty result for a chunk
    pub fn empty(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Default::default()
        }
    }

    /// Total number of claims
    pub fn len(&self) -> usize {
        self.events.len() + self.facts.len()
    }

    /// Whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.facts.is_empty()
    }
}

/// Trait for extracting claims from text
///
/// Implemented by the application layer (plutarch-extractor)
pub trait Extractor {
    /// Error type for extraction operations
    type Error;

    /// Extract candidate claims from one chunk
    fn extract(&self, chunk: &SourceChunk) -> Result<ChunkClaims, Self::Error>;
}

/// A canonicalizer's choice of name for a cluster of variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalChoice {
    /// Chosen canonical name
    pub canonical_name: String,
    /// Confidence in the choice
    pub confidence: Confidence,
    /// Why it was chosen
    pub reasoning: String,
}

/// Picks a canonical name for a cluster of surface-form variants
pub trait Canonicalizer {
    /// Error type for canonicalization
    type Error;

    /// Choose a canonical name for `variants` (always more than one)
    fn canonicalize(
        &self,
        variants: &[String],
        entity_type: EntityType,
    ) -> Result<CanonicalChoice, Self::Error>;
}

/// Binary verdict a consolidator may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictDecision {
    /// Members describe one event
    SameEvent,
    /// Members describe distinct events
    DifferentEvents,
}

/// Fields a consolidator proposes for a merged record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedFields {
    /// Organization display name
    #[serde(default)]
    pub organization: Option<String>,
    /// Roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Locations
    #[serde(default)]
    pub locations: Vec<String>,
    /// Span
    #[serde(default)]
    pub time: TimeSpan,
}

/// A consolidator's verdict on a candidate group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationVerdict {
    /// Same or different events
    pub decision: VerdictDecision,
    /// Proposed merged fields; empty fields fall back to member data
    #[serde(default)]
    pub fields: ConsolidatedFields,
    /// Why
    #[serde(default)]
    pub reasoning: String,
    /// Confidence, if the consolidator reported one
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

/// Decides whether a multi-member candidate group is one event
pub trait Consolidator {
    /// Error type for consolidation
    type Error;

    /// Judge a group of claims
    fn consolidate(&self, group: &[EventClaim]) -> Result<ConsolidationVerdict, Self::Error>;
}

/// Merge or create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDecision {
    /// Fold into an existing event
    Merge,
    /// Create a new event
    New,
}

/// A match decider's verdict for one candidate claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchVerdict {
    /// Merge or new
    pub decision: MatchDecision,
    /// Code of the target event when merging
    #[serde(default)]
    pub target_event_code: Option<String>,
    /// Why
    #[serde(default)]
    pub reasoning: String,
    /// Confidence in the verdict
    #[serde(default)]
    pub confidence: Confidence,
}

/// Decides whether a new claim belongs to an existing event
pub trait MatchDecider {
    /// Error type for match decisions
    type Error;

    /// Judge `candidate` against summaries of the active events
    fn decide(
        &self,
        candidate: &EventClaim,
        existing: &[EventSummary],
    ) -> Result<MatchVerdict, Self::Error>;
}
