//! Reconciler error types

use thiserror::Error;

/// Errors raised by the reconciler and its capability adapters
///
/// Only `Config` ever escapes a reconciliation run. The other variants are
/// returned by capability adapters and turned into documented fallbacks by
/// the component that called them.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backing LLM failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// A capability answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A rule-based capability has no rule for the input
    #[error("No rule matched: {0}")]
    NoRule(String),
}

impl From<plutarch_llm::LlmError> for ReconcileError {
    fn from(err: plutarch_llm::LlmError) -> Self {
        match err {
            plutarch_llm::LlmError::InvalidResponse(msg) => Self::InvalidResponse(msg),
            other => Self::Llm(other.to_string()),
        }
    }
}
