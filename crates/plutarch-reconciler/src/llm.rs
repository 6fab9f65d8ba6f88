//! LLM-backed capabilities
//!
//! Each adapter formats a prompt, asks the provider, and parses the JSON
//! answer. Any failure is returned as an error; the calling component
//! applies its fallback.

use crate::error::ReconcileError;
use plutarch_domain::{
    CanonicalChoice, Canonicalizer, Confidence, ConsolidatedFields, ConsolidationVerdict,
    Consolidator, EntityType, EventClaim, EventSummary, LlmProvider, MatchDecider, MatchDecision,
    MatchVerdict, TimeSpan, VerdictDecision,
};
use serde::Deserialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

fn ask<L>(llm: &L, prompt: &str) -> Result<String, ReconcileError>
where
    L: LlmProvider,
    L::Error: Display,
{
    debug!("Prompt length: {} chars", prompt.len());
    llm.generate(prompt)
        .map_err(|e| ReconcileError::Llm(e.to_string()))
}

fn confidence_or(label: Option<&str>, default: Confidence) -> Confidence {
    label.and_then(Confidence::parse).unwrap_or(default)
}

/// Canonicalizer asking an LLM to name a cluster of variants
pub struct LlmCanonicalizer<L> {
    llm: Arc<L>,
}

#[derive(Deserialize)]
struct CanonicalResponse {
    #[serde(default = "default_true")]
    same_entity: bool,
    #[serde(default)]
    canonical_name: Option<String>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    confidence: Option<String>,
}

fn default_true() -> bool {
    true
}

impl<L> LlmCanonicalizer<L> {
    /// Create a canonicalizer over a shared provider
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }
}

impl<L> Canonicalizer for LlmCanonicalizer<L>
where
    L: LlmProvider,
    L::Error: Display,
{
    type Error = ReconcileError;

    fn canonicalize(
        &self,
        variants: &[String],
        entity_type: EntityType,
    ) -> Result<CanonicalChoice, Self::Error> {
        let first = variants
            .first()
            .ok_or_else(|| ReconcileError::InvalidResponse("empty cluster".to_string()))?;

        let list = variants
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}. {}", i + 1, v))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "{}\n\nEntity type: {}\nVariants:\n{}\n\n{}",
            CANONICALIZE_INSTRUCTIONS, entity_type, list, CANONICALIZE_FORMAT
        );

        let response: CanonicalResponse = plutarch_llm::parse_json(&ask(&*self.llm, &prompt)?)?;

        if !response.same_entity {
            return Ok(CanonicalChoice {
                canonical_name: first.clone(),
                confidence: Confidence::Low,
                reasoning: format!("variants judged distinct: {}", response.reasoning),
            });
        }

        let canonical_name = response
            .canonical_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ReconcileError::InvalidResponse("missing canonical_name".to_string()))?;

        Ok(CanonicalChoice {
            canonical_name,
            confidence: confidence_or(response.confidence.as_deref(), Confidence::High),
            reasoning: response.reasoning,
        })
    }
}

const CANONICALIZE_INSTRUCTIONS: &str = r#"The following names were written by different sources and may refer to the same entity.
Decide whether they all name the same real-world entity and, if so, choose the most complete official name."#;

const CANONICALIZE_FORMAT: &str = r#"Output format (JSON object only, no additional text):
{"same_entity": true, "canonical_name": "name", "reasoning": "short explanation", "confidence": "low" | "medium" | "high"}"#;

/// Consolidator asking an LLM whether a candidate group is one event
pub struct LlmConsolidator<L> {
    llm: Arc<L>,
}

#[derive(Deserialize)]
struct ConsolidateResponse {
    decision: String,
    #[serde(default)]
    consolidated: ConsolidatedResponse,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    confidence: Option<String>,
}

#[derive(Deserialize, Default)]
struct ConsolidatedResponse {
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    start_year: Option<i32>,
    #[serde(default)]
    end_year: Option<i32>,
}

impl<L> LlmConsolidator<L> {
    /// Create a consolidator over a shared provider
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }
}

/// Render one claim the way consolidation prompts show it
pub fn format_claim(claim: &EventClaim, index: usize) -> String {
    let mut lines = vec![format!("EVENT {}:", index)];
    lines.push(format!("  Type: {:?}", claim.kind));
    lines.push(format!("  Time: {}", claim.time));
    if let Some(org) = &claim.organization {
        lines.push(format!("  Organization: {}", org));
    }
    if !claim.roles.is_empty() {
        lines.push(format!("  Roles: {}", claim.roles.join(", ")));
    }
    if !claim.locations.is_empty() {
        lines.push(format!("  Locations: {}", claim.locations.join(", ")));
    }
    if !claim.time_markers.is_empty() {
        lines.push(format!("  Time markers: {}", claim.time_markers.join(", ")));
    }
    if !claim.evidence_quote.is_empty() {
        lines.push(format!("  Quote: \"{}\"", claim.evidence_quote));
    }
    lines.push(format!("  Source: {} ({})", claim.source_id, claim.source_domain));
    lines.join("\n")
}

impl<L> Consolidator for LlmConsolidator<L>
where
    L: LlmProvider,
    L::Error: Display,
{
    type Error = ReconcileError;

    fn consolidate(&self, group: &[EventClaim]) -> Result<ConsolidationVerdict, Self::Error> {
        let events = group
            .iter()
            .enumerate()
            .map(|(i, c)| format_claim(c, i + 1))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = format!(
            "{}\n\n{}\n\n{}",
            CONSOLIDATE_INSTRUCTIONS, events, CONSOLIDATE_FORMAT
        );

        let response: ConsolidateResponse = plutarch_llm::parse_json(&ask(&*self.llm, &prompt)?)?;

        let decision = match response.decision.trim().to_ascii_lowercase().as_str() {
            "same_event" | "same" => VerdictDecision::SameEvent,
            "different_events" | "different" => VerdictDecision::DifferentEvents,
            other => {
                return Err(ReconcileError::InvalidResponse(format!(
                    "unknown decision '{}'",
                    other
                )))
            }
        };

        let consolidated = response.consolidated;
        let mut roles = consolidated.roles;
        if let Some(role) = consolidated.role {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }

        Ok(ConsolidationVerdict {
            decision,
            fields: ConsolidatedFields {
                organization: consolidated.organization,
                roles,
                locations: consolidated.locations,
                time: TimeSpan {
                    start: consolidated.start_year,
                    end: consolidated.end_year,
                },
            },
            reasoning: response.reasoning,
            confidence: response.confidence.as_deref().and_then(Confidence::parse),
        })
    }
}

const CONSOLIDATE_INSTRUCTIONS: &str = r#"The following career events about one person were extracted from different sources.
Decide whether they all describe the SAME real-world event (one position or award) or DIFFERENT events.
Treat spelling variants and abbreviations of one organization as the same organization.
Different roles at the same organization in overlapping years can still be one event if one title is a variant of the other."#;

const CONSOLIDATE_FORMAT: &str = r#"Output format (JSON object only, no additional text):
{
  "decision": "same_event" | "different_events",
  "consolidated": {
    "organization": "name or null",
    "roles": ["title"],
    "locations": ["place"],
    "start_year": 1990,
    "end_year": 1995
  },
  "reasoning": "short explanation",
  "confidence": "low" | "medium" | "high"
}"#;

/// Match decider asking an LLM to merge a claim or create a new event
pub struct LlmMatchDecider<L> {
    llm: Arc<L>,
}

#[derive(Deserialize)]
struct MatchResponse {
    decision: String,
    #[serde(default, alias = "target_event_code")]
    target_event_id: Option<String>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    confidence: Option<String>,
}

impl<L> LlmMatchDecider<L> {
    /// Create a match decider over a shared provider
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }
}

impl<L> MatchDecider for LlmMatchDecider<L>
where
    L: LlmProvider,
    L::Error: Display,
{
    type Error = ReconcileError;

    fn decide(
        &self,
        candidate: &EventClaim,
        existing: &[EventSummary],
    ) -> Result<MatchVerdict, Self::Error> {
        let candidate_json = serde_json::to_string_pretty(candidate)
            .map_err(|e| ReconcileError::InvalidResponse(e.to_string()))?;
        let existing_json = serde_json::to_string_pretty(existing)
            .map_err(|e| ReconcileError::InvalidResponse(e.to_string()))?;
        let prompt = format!(
            "{}\n\nCANDIDATE:\n{}\n\nEXISTING EVENTS:\n{}\n\n{}",
            MATCH_INSTRUCTIONS, candidate_json, existing_json, MATCH_FORMAT
        );

        let response: MatchResponse = plutarch_llm::parse_json(&ask(&*self.llm, &prompt)?)?;

        let decision = match response.decision.trim().to_ascii_lowercase().as_str() {
            "merge" => MatchDecision::Merge,
            "new" => MatchDecision::New,
            other => {
                return Err(ReconcileError::InvalidResponse(format!(
                    "unknown decision '{}'",
                    other
                )))
            }
        };

        Ok(MatchVerdict {
            decision,
            target_event_code: response.target_event_id,
            reasoning: response.reasoning,
            confidence: confidence_or(response.confidence.as_deref(), Confidence::Medium),
        })
    }
}

const MATCH_INSTRUCTIONS: &str = r#"Determine if this CANDIDATE event should be merged with an existing event or created as new.
Merge only when the candidate describes the same position or award as an existing event, allowing for
name variants, partial dates and additional roles. Refer to existing events by their "event_code"."#;

const MATCH_FORMAT: &str = r#"Output format (JSON object only, no additional text):
{"decision": "merge" | "new", "target_event_id": "event_code or null", "reasoning": "short explanation", "confidence": "low" | "medium" | "high"}"#;
