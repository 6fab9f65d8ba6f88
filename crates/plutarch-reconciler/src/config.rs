//! Configuration for reconciliation runs

use serde::{Deserialize, Serialize};

/// Thresholds and limits for one reconciliation run
///
/// # Examples
///
/// ```
/// use plutarch_reconciler::ReconcilerConfig;
///
/// let config = ReconcilerConfig::default();
/// assert_eq!(config.fuzzy_threshold, 85);
/// assert_eq!(config.quorum, 2);
///
/// let strict = ReconcilerConfig::strict();
/// assert_eq!(strict.quorum, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Minimum similarity (0-100) for two organization mentions to cluster
    pub fuzzy_threshold: u8,

    /// Minimum similarity (0-100) for two role mentions to cluster
    pub role_fuzzy_threshold: u8,

    /// Independent source domains needed to accept a scalar value
    pub quorum: usize,

    /// Stop scanning chunks once a scalar fact is decisive
    pub early_stop: bool,

    /// Positive claims required before an early stop is allowed
    pub early_stop_min_claims: usize,

    /// Hard cap on positive claims scanned for one scalar fact
    pub max_claims_scanned: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 85,
            role_fuzzy_threshold: 85,
            quorum: 2,
            early_stop: true,
            early_stop_min_claims: 2,
            max_claims_scanned: 20,
        }
    }
}

impl ReconcilerConfig {
    /// Strict preset: tighter clustering, three independent sources
    pub fn strict() -> Self {
        Self {
            fuzzy_threshold: 92,
            role_fuzzy_threshold: 90,
            quorum: 3,
            early_stop: true,
            early_stop_min_claims: 3,
            max_claims_scanned: 40,
        }
    }

    /// Lenient preset: looser clustering, single-source acceptance
    pub fn lenient() -> Self {
        Self {
            fuzzy_threshold: 75,
            role_fuzzy_threshold: 75,
            quorum: 1,
            early_stop: true,
            early_stop_min_claims: 1,
            max_claims_scanned: 10,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fuzzy_threshold > 100 {
            return Err("fuzzy_threshold must be between 0 and 100".to_string());
        }
        if self.role_fuzzy_threshold > 100 {
            return Err("role_fuzzy_threshold must be between 0 and 100".to_string());
        }
        if self.quorum == 0 {
            return Err("quorum must be at least 1".to_string());
        }
        if self.early_stop_min_claims == 0 {
            return Err("early_stop_min_claims must be at least 1".to_string());
        }
        if self.max_claims_scanned < self.early_stop_min_claims {
            return Err(format!(
                "max_claims_scanned ({}) must be at least early_stop_min_claims ({})",
                self.max_claims_scanned, self.early_stop_min_claims
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
