//! Plutarch CLI - Command-line interface for the Plutarch reconciliation engine.

use clap::Parser;
use plutarch_cli::commands;
use plutarch_cli::{Cli, Command, Config, Engine, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> plutarch_cli::Result<()> {
    let cli = Cli::parse();

    // Configuration errors are fatal before any claim is read
    let config = Config::load(cli.config.as_deref())?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Config => commands::execute_config(&config)?,
        Command::Reconcile(args) => {
            let mut engine = Engine::from_config(&config)?;
            commands::execute_reconcile(args, &mut engine, &formatter)?;
        }
        Command::Consensus(args) => {
            let engine = Engine::from_config(&config)?;
            commands::execute_consensus(args, engine, &formatter)?;
        }
        Command::Merge(args) => {
            let mut engine = Engine::from_config(&config)?;
            commands::execute_merge(args, &mut engine, &formatter)?;
        }
    }

    Ok(())
}
