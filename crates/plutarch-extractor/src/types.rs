//! Result types for extraction

use plutarch_domain::ChunkClaims;
use serde::{Deserialize, Serialize};

/// Result of extracting one chunk
#[derive(Debug, Clone)]
pub struct ChunkExtraction {
    /// Claims that passed the gatekeeper
    pub claims: ChunkClaims,

    /// Entries that were skipped
    pub failures: Vec<ExtractionFailure>,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Information about an entry that failed to become a claim
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    /// Reason for failure
    pub reason: String,

    /// Raw entry text
    pub raw_text: String,
}

/// Metadata about an extraction operation
#[derive(Debug, Clone)]
pub struct ExtractionMetadata {
    /// Source identifier
    pub source_id: String,

    /// Name of the LLM model used
    pub model_name: String,

    /// Entries found in the response
    pub total_entries: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Outcome of one chunk within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Extraction produced a (possibly empty) claim set
    Succeeded,
    /// Every attempt failed; the chunk contributes no claims
    Failed,
}

/// One `(item, status, error)` row of a batch report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Chunk identifier
    pub source_id: String,

    /// Outcome
    pub status: ItemStatus,

    /// Last error, when failed
    pub error: Option<String>,

    /// Attempts made
    pub attempts: u32,

    /// Claims extracted
    pub claim_count: usize,
}

/// Result of a batch extraction, in input order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// One row per input chunk
    pub items: Vec<BatchItem>,

    /// Claims from successful chunks
    pub claims: Vec<ChunkClaims>,
}

impl BatchReport {
    /// Number of chunks that succeeded
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Succeeded)
            .count()
    }

    /// Number of chunks that failed
    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// Total claims across all successful chunks
    pub fn total_claims(&self) -> usize {
        self.claims.iter().map(ChunkClaims::len).sum()
    }
}
