//! Plutarch Extractor
//!
//! Converts source chunks into event and fact claims using an LLM.
//!
//! # Architecture
//!
//! ```text
//! SourceChunk → LlmExtractor → LLM → parser → Gatekeeper → ChunkClaims
//! ```
//!
//! # Key Features
//!
//! - **Prompting**: asks for `{"events": [...], "facts": [...]}`
//! - **Tolerant parsing**: fenced or prose-wrapped JSON is recovered;
//!   malformed entries are skipped, never fatal
//! - **Heuristics**: evidence classification, time-marker normalization,
//!   source-domain derivation
//! - **Batch processing**: bounded worker pool, per-chunk retry with
//!   exponential backoff, per-chunk `(item, status, error)` report
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use plutarch_domain::SourceChunk;
//! use plutarch_extractor::{ExtractorConfig, LlmExtractor};
//! use plutarch_gatekeeper::Gatekeeper;
//! use plutarch_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"events": [], "facts": []}"#);
//! let extractor = Arc::new(LlmExtractor::new(
//!     llm,
//!     Gatekeeper::default_config(),
//!     ExtractorConfig::default(),
//! )?);
//!
//! let chunks = vec![SourceChunk {
//!     source_id: "doc_001".to_string(),
//!     source_domain: "who.int".to_string(),
//!     text: "Margaret Chan served as Director-General of WHO.".to_string(),
//! }];
//!
//! let report = extractor.extract_batch(chunks).await;
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod classify;
mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use classify::{classify_evidence_type, find_year, normalize_time_marker, source_domain};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::LlmExtractor;
pub use parser::{parse_llm_response, ParsedResponse};
pub use prompt::PromptBuilder;
pub use types::{
    BatchItem, BatchReport, ChunkExtraction, ExtractionFailure, ExtractionMetadata, ItemStatus,
};
