//! Plutarch Gatekeeper
//!
//! Validates extracted claims at the capability boundary, before they reach
//! reconciliation. Extractor output is never trusted implicitly.
//!
//! The Gatekeeper provides:
//! - Quote presence checks
//! - Plausible-year bounds
//! - Span ordering checks
//! - In-batch duplicate detection
//! - Quality scoring
//!
//! # Examples
//!
//! ```
//! use plutarch_domain::{EventClaim, TimeSpan};
//! use plutarch_gatekeeper::{Gatekeeper, ValidationConfig, ValidationStatus};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default()).unwrap();
//! let claim = EventClaim::new("c1", "doc-1", "who.int")
//!     .with_organization("WHO")
//!     .with_time(TimeSpan::range(2007, 2017))
//!     .with_quote("served as Director-General of WHO from 2007 to 2017");
//!
//! let result = gatekeeper.validate_event(&claim, &[]);
//! assert_eq!(result.status, ValidationStatus::Accepted);
//! ```

#![warn(missing_docs)]

mod validator;
mod error;
mod config;

pub use validator::{Gatekeeper, ValidationResult, ValidationStatus, RejectionReason};
pub use error::GatekeeperError;
pub use config::ValidationConfig;
