//! Plutarch CLI library.
//!
//! Configuration loading, capability wiring, command execution, and output
//! formatting for the `plutarch` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use engine::Engine;
pub use error::{CliError, Result};
pub use output::Formatter;
