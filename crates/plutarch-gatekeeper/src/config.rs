//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

use crate::GatekeeperError;

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject claims without a supporting quote
    pub require_quote: bool,

    /// Enable plausible-year bounds checking
    pub validate_year_bounds: bool,

    /// Earliest plausible year
    pub min_year: i32,

    /// Latest plausible year
    pub max_year: i32,

    /// Reject spans whose start is after their end
    pub validate_span_order: bool,

    /// Reject event claims naming neither an organization nor a role
    pub validate_identity: bool,

    /// Reject exact repeats within one source
    pub validate_duplicates: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_quote: true,
            validate_year_bounds: true,
            min_year: 1600,
            max_year: 2099,
            validate_span_order: true,
            validate_identity: true,
            validate_duplicates: true,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (minimal validation)
    pub fn permissive() -> Self {
        Self {
            require_quote: false,
            validate_year_bounds: true,
            min_year: 1,
            max_year: 9999,
            validate_span_order: false,
            validate_identity: false,
            validate_duplicates: false,
        }
    }

    /// Create a strict configuration (all validations enabled, tight years)
    pub fn strict() -> Self {
        Self {
            require_quote: true,
            validate_year_bounds: true,
            min_year: 1800,
            max_year: 2029,
            validate_span_order: true,
            validate_identity: true,
            validate_duplicates: true,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        if self.min_year > self.max_year {
            return Err(GatekeeperError::InvertedYearWindow {
                min_year: self.min_year,
                max_year: self.max_year,
            });
        }
        if self.min_year < 1 {
            return Err(GatekeeperError::YearBeforeEra(self.min_year));
        }
        Ok(())
    }
}
