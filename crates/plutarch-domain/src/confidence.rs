//! Ordinal confidence labels
//!
//! Confidence is a closed, totally ordered scale `low < medium < high`. Merges
//! may only move it upward; fallbacks always report `low`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence attached to a decision or a consolidated record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Fallback or weakly supported
    Low,
    /// Default for extracted claims
    #[default]
    Medium,
    /// Trivially certain or strongly corroborated
    High,
}

impl Confidence {
    /// Parse a confidence label, tolerating case and surrounding whitespace
    ///
    /// # Examples
    ///
    /// ```
    /// use plutarch_domain::Confidence;
    ///
    /// assert_eq!(Confidence::parse(" HIGH "), Some(Confidence::High));
    /// assert_eq!(Confidence::parse("certain"), None);
    /// ```
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Return the stronger of two confidences
    ///
    /// This is the only way a merge changes confidence, so it never goes down.
    pub fn upgraded(self, other: Confidence) -> Self {
        self.max(other)
    }

    /// Lowercase label used in JSON and tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
