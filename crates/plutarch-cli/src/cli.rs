//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Plutarch - Reconcile conflicting claims about a person's life.
#[derive(Debug, Parser)]
#[command(name = "plutarch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PLUTARCH_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (codes and values only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile event claims into a consolidated timeline
    Reconcile(ReconcileArgs),

    /// Compute consensus for a single-valued attribute
    Consensus(ConsensusArgs),

    /// Merge new event claims into existing events
    Merge(MergeArgs),

    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for the reconcile command.
#[derive(Debug, Parser)]
pub struct ReconcileArgs {
    /// JSON file containing an array of event claims
    #[arg(long)]
    pub claims: String,
}

/// Arguments for the consensus command.
#[derive(Debug, Parser)]
pub struct ConsensusArgs {
    /// JSON file containing an array of scalar claims
    #[arg(long, required_unless_present = "chunks", conflicts_with = "chunks")]
    pub claims: Option<String>,

    /// JSON file of source chunks to extract and scan until consensus
    #[arg(long)]
    pub chunks: Option<String>,

    /// Attribute to decide
    #[arg(short, long, default_value = "birth_year")]
    pub attribute: String,

    /// Person the chunks are about
    #[arg(short, long)]
    pub person: Option<String>,
}

/// Arguments for the merge command.
#[derive(Debug, Parser)]
pub struct MergeArgs {
    /// JSON file containing existing consolidated events
    #[arg(long)]
    pub events: String,

    /// JSON file containing new event claims
    #[arg(long)]
    pub claims: String,

    /// Write the updated events to this file
    #[arg(short, long)]
    pub output: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_command() {
        let cli = Cli::parse_from(["plutarch", "reconcile", "--claims", "claims.json"]);
        match cli.command {
            Command::Reconcile(args) => assert_eq!(args.claims, "claims.json"),
            _ => panic!("Expected Reconcile command"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["plutarch", "config", "--format", "json", "--config", "p.toml"]);
        assert!(matches!(cli.command, Command::Config));
        assert_eq!(cli.format, Some(CliFormat::Json));
        assert_eq!(cli.config.as_deref(), Some("p.toml"));
    }

    #[test]
    fn test_consensus_defaults_to_birth_year() {
        let cli = Cli::parse_from(["plutarch", "consensus", "--claims", "facts.json"]);
        match cli.command {
            Command::Consensus(args) => {
                assert_eq!(args.attribute, "birth_year");
                assert!(args.chunks.is_none());
            }
            _ => panic!("Expected Consensus command"),
        }
    }

    #[test]
    fn test_consensus_requires_an_input() {
        assert!(Cli::try_parse_from(["plutarch", "consensus"]).is_err());
        assert!(Cli::try_parse_from([
            "plutarch", "consensus", "--claims", "a.json", "--chunks", "b.json"
        ])
        .is_err());
    }

    #[test]
    fn test_merge_command() {
        let cli = Cli::parse_from([
            "plutarch", "merge", "--events", "events.json", "--claims", "new.json", "-o", "out.json",
        ]);
        match cli.command {
            Command::Merge(args) => {
                assert_eq!(args.events, "events.json");
                assert_eq!(args.output.as_deref(), Some("out.json"));
            }
            _ => panic!("Expected Merge command"),
        }
    }
}
