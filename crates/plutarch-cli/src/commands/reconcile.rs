//! Reconcile command implementation.

use super::read_json;
use crate::cli::ReconcileArgs;
use crate::engine::Engine;
use crate::error::Result;
use crate::output::Formatter;
use plutarch_domain::EventClaim;
use tracing::debug;

/// Execute the reconcile command.
pub fn execute_reconcile(
    args: ReconcileArgs,
    engine: &mut Engine,
    formatter: &Formatter,
) -> Result<()> {
    let claims: Vec<EventClaim> = read_json(&args.claims)?;
    let run = engine.reconcile(&claims);
    debug!("{}", engine.metrics().summary());

    println!("{}", formatter.format_reconcile(&run)?);
    Ok(())
}
