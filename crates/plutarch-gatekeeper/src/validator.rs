//! Claim validation logic

use crate::{GatekeeperError, ValidationConfig};
use plutarch_domain::{Claim, ClaimId, ClaimValue, EventClaim, TimeSpan};
use tracing::debug;

/// Result of claim validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the claim passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,

    /// Quality score (0.0-1.0)
    pub quality_score: f64,
}

impl ValidationResult {
    /// Whether the claim may proceed to reconciliation
    pub fn is_usable(&self) -> bool {
        self.status != ValidationStatus::Rejected
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Claim accepted
    Accepted,

    /// Claim rejected
    Rejected,

    /// Claim kept but carries no usable value
    Deferred,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// No verbatim supporting quote
    MissingQuote,

    /// A year outside the plausible range
    ImplausibleYear {
        /// Offending year
        year: i32,
        /// Lower bound
        min: i32,
        /// Upper bound
        max: i32,
    },

    /// Span start after span end
    InvertedSpan {
        /// Start year
        start: i32,
        /// End year
        end: i32,
    },

    /// Event claim names neither organization nor role
    MissingIdentity,

    /// Scalar claim without a value
    MissingValue,

    /// Same assertion already accepted from the same source
    Duplicate {
        /// ID of the earlier claim
        existing_id: ClaimId,
    },
}

/// The Gatekeeper validates claims before reconciliation
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Result<Self, GatekeeperError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate an event claim
    ///
    /// # Arguments
    ///
    /// * `claim` - The claim to validate
    /// * `accepted` - Claims already accepted from the same batch, for duplicate detection
    pub fn validate_event(&self, claim: &EventClaim, accepted: &[EventClaim]) -> ValidationResult {
        let mut reasons = Vec::new();
        let mut quality_score: f64 = 1.0;

        // 1. Quote presence
        if self.config.require_quote && claim.evidence_quote.trim().is_empty() {
            reasons.push(RejectionReason::MissingQuote);
            quality_score -= 0.3;
        }

        // 2. Identity
        if self.config.validate_identity
            && claim.organization.as_deref().is_none_or(|o| o.trim().is_empty())
            && claim.roles.iter().all(|r| r.trim().is_empty())
        {
            reasons.push(RejectionReason::MissingIdentity);
            quality_score -= 0.3;
        }

        // 3. Time span plausibility
        if let Some(reason) = self.check_span(&claim.time) {
            reasons.push(reason);
            quality_score -= 0.4;
        }

        // 4. Duplicate detection
        if self.config.validate_duplicates {
            if let Some(existing) = accepted.iter().find(|a| same_assertion(a, claim)) {
                reasons.push(RejectionReason::Duplicate {
                    existing_id: existing.claim_id.clone(),
                });
                quality_score -= 0.5;
            }
        }

        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };

        if status == ValidationStatus::Rejected {
            debug!(claim_id = %claim.claim_id, ?reasons, "Event claim rejected");
        }

        ValidationResult {
            status,
            reasons,
            quality_score: quality_score.max(0.0),
        }
    }

    /// Validate a scalar-fact claim
    pub fn validate_fact(&self, claim: &Claim) -> ValidationResult {
        let mut reasons = Vec::new();
        let mut quality_score: f64 = 1.0;

        let Some(value) = &claim.raw_value else {
            return ValidationResult {
                status: ValidationStatus::Deferred,
                reasons: vec![RejectionReason::MissingValue],
                quality_score: 0.0,
            };
        };

        if self.config.require_quote && claim.evidence_quote.trim().is_empty() {
            reasons.push(RejectionReason::MissingQuote);
            quality_score -= 0.3;
        }

        let span_reason = match value {
            ClaimValue::Year(year) => self.check_year(*year),
            ClaimValue::TimeRange(span) => self.check_span(span),
            ClaimValue::Text(_) => None,
        };
        if let Some(reason) = span_reason {
            reasons.push(reason);
            quality_score -= 0.4;
        }

        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            debug!(claim_id = %claim.claim_id, ?reasons, "Fact claim rejected");
            ValidationStatus::Rejected
        };

        ValidationResult {
            status,
            reasons,
            quality_score: quality_score.max(0.0),
        }
    }

    fn check_year(&self, year: i32) -> Option<RejectionReason> {
        if !self.config.validate_year_bounds {
            return None;
        }
        if year < self.config.min_year || year > self.config.max_year {
            return Some(RejectionReason::ImplausibleYear {
                year,
                min: self.config.min_year,
                max: self.config.max_year,
            });
        }
        None
    }

    fn check_span(&self, span: &TimeSpan) -> Option<RejectionReason> {
        for year in [span.start, span.end].into_iter().flatten() {
            if let Some(reason) = self.check_year(year) {
                return Some(reason);
            }
        }
        if self.config.validate_span_order {
            if let (Some(start), Some(end)) = (span.start, span.end) {
                if start > end {
                    return Some(RejectionReason::InvertedSpan { start, end });
                }
            }
        }
        None
    }
}

fn same_assertion(a: &EventClaim, b: &EventClaim) -> bool {
    a.source_id == b.source_id
        && a.kind == b.kind
        && a.organization == b.organization
        && a.roles == b.roles
        && a.time == b.time
}
