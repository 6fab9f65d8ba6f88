//! Config command implementation.

use crate::config::Config;
use crate::error::Result;

/// Print the effective configuration.
pub fn execute_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
