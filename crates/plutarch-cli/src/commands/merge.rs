//! Merge command implementation.

use super::read_json;
use crate::cli::MergeArgs;
use crate::engine::Engine;
use crate::error::Result;
use crate::output::Formatter;
use plutarch_domain::{ConsolidatedEvent, EventClaim};
use std::fs;
use tracing::info;

/// Execute the merge command.
pub fn execute_merge(args: MergeArgs, engine: &mut Engine, formatter: &Formatter) -> Result<()> {
    let mut events: Vec<ConsolidatedEvent> = read_json(&args.events)?;
    let claims: Vec<EventClaim> = read_json(&args.claims)?;

    let outcomes = engine.merge(&mut events, &claims);

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&events)?)?;
        info!("Wrote {} events to {}", events.len(), path);
    }

    println!("{}", formatter.format_merge(&outcomes, &events)?);
    Ok(())
}
