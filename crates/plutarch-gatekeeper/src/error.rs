//! Gatekeeper error types

use thiserror::Error;

/// A validation configuration the gatekeeper refuses to run with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatekeeperError {
    /// `min_year` is after `max_year`, so every dated claim would be rejected
    #[error("min_year ({min_year}) must not exceed max_year ({max_year})")]
    InvertedYearWindow {
        /// Configured lower bound
        min_year: i32,
        /// Configured upper bound
        max_year: i32,
    },

    /// Year window reaches before year 1
    #[error("year window must start at year 1 or later, got {0}")]
    YearBeforeEra(i32),
}
