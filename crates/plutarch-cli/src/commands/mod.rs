//! Command implementations.

pub mod config;
pub mod consensus;
pub mod merge;
pub mod reconcile;

pub use self::config::execute_config;
pub use self::consensus::execute_consensus;
pub use self::merge::execute_merge;
pub use self::reconcile::execute_reconcile;

use crate::error::{CliError, Result};
use serde::de::DeserializeOwned;
use std::fs;

/// Read a JSON array from `path`, naming the file in parse errors.
pub(crate) fn read_json<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| CliError::InvalidInput(format!("{}: {}", path, e)))
}
