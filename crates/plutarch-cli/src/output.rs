//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use plutarch_domain::{ConsolidatedEvent, ConsensusStatus, MatchDecision, ScalarConsensus};
use plutarch_reconciler::{narrative, MergeOutcome, ReconcileRun, ScanOutcome};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a reconciliation run.
    pub fn format_reconcile(&self, run: &ReconcileRun) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(run)?),
            OutputFormat::Table => {
                let summary = &run.timeline.summary;
                let years = match (summary.earliest_year, summary.latest_year) {
                    (Some(first), Some(last)) => format!(", {}-{}", first, last),
                    _ => String::new(),
                };
                Ok(format!(
                    "{}\n{}",
                    self.format_events_table(&run.timeline.events),
                    self.info(&format!(
                        "{} events ({} merged, {} kept distinct, {} singletons){}",
                        summary.total_events,
                        summary.merged,
                        summary.kept_distinct,
                        summary.singletons,
                        years
                    ))
                ))
            }
            OutputFormat::Quiet => Ok(event_codes(&run.timeline.events)),
        }
    }

    /// Format a scalar consensus with its narrative.
    pub fn format_consensus(&self, consensus: &ScalarConsensus) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "consensus": consensus,
                "narrative": narrative(consensus),
            }))?),
            OutputFormat::Table => {
                let text = narrative(consensus);
                let status_line = format!("Status: {}", consensus.status);
                let colored_status = self.colorize(&status_line, status_color(consensus.status));
                Ok(text.replacen(&status_line, &colored_status, 1).trim_end().to_string())
            }
            OutputFormat::Quiet => Ok(consensus
                .candidate_value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()),
        }
    }

    /// Format an early-stopping scan.
    pub fn format_scan(&self, outcome: &ScanOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "scan": outcome,
                "narrative": narrative(&outcome.consensus),
            }))?),
            OutputFormat::Table => {
                let mut lines = vec![self.format_consensus(&outcome.consensus)?, String::new()];
                lines.push(self.info(&format!(
                    "Scanned {} chunk(s), {} claim(s){}",
                    outcome.chunks_scanned,
                    outcome.claims_scanned,
                    if outcome.stopped_early {
                        ", stopped early"
                    } else {
                        ""
                    }
                )));
                for failure in &outcome.failures {
                    lines.push(self.warning(&format!("{}: {}", failure.source_id, failure.error)));
                }
                Ok(lines.join("\n"))
            }
            OutputFormat::Quiet => self.format_consensus(&outcome.consensus),
        }
    }

    /// Format merge outcomes and the updated events.
    pub fn format_merge(
        &self,
        outcomes: &[MergeOutcome],
        events: &[ConsolidatedEvent],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "outcomes": outcomes,
                "events": events,
            }))?),
            OutputFormat::Table => {
                if outcomes.is_empty() {
                    return Ok(self.colorize("No claims to merge.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Claim", "Decision", "Event", "Added", "Confidence", "Reasoning"]);
                for outcome in outcomes {
                    let decision = match (outcome.decision, outcome.fell_back) {
                        (MatchDecision::Merge, _) => "merge",
                        (MatchDecision::New, false) => "new",
                        (MatchDecision::New, true) => "new (fallback)",
                    };
                    builder.push_record([
                        outcome.claim_id.clone(),
                        decision.to_string(),
                        outcome.event_code.clone(),
                        format!("{:?}", outcome.contribution).to_lowercase(),
                        outcome.confidence.to_string(),
                        outcome.reasoning.clone(),
                    ]);
                }

                let merged = outcomes
                    .iter()
                    .filter(|o| o.decision == MatchDecision::Merge)
                    .count();
                Ok(format!(
                    "{}\n{}",
                    styled(builder),
                    self.success(&format!(
                        "{} merged, {} created, {} events total",
                        merged,
                        outcomes.len() - merged,
                        events.len()
                    ))
                ))
            }
            OutputFormat::Quiet => Ok(outcomes
                .iter()
                .map(|o| format!("{} {}", o.claim_id, o.event_code))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_events_table(&self, events: &[ConsolidatedEvent]) -> String {
        if events.is_empty() {
            return self.colorize("No events found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Code", "Time", "Organization", "Roles", "Decision", "Sources", "Confidence"]);
        for event in events {
            builder.push_record([
                event.event_code.clone(),
                event.time_span().to_string(),
                event.organization.clone().unwrap_or_default(),
                event.roles.iter().cloned().collect::<Vec<_>>().join(", "),
                event.decision.to_string(),
                event.source_count().to_string(),
                event.confidence.to_string(),
            ]);
        }
        styled(builder)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn event_codes(events: &[ConsolidatedEvent]) -> String {
    events
        .iter()
        .map(|e| e.event_code.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_color(status: ConsensusStatus) -> &'static str {
    match status {
        ConsensusStatus::Verified | ConsensusStatus::ConflictResolved => "green",
        ConsensusStatus::NoEvidence | ConsensusStatus::ConflictInconclusive => "red",
        _ => "yellow",
    }
}
