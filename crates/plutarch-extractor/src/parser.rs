//! Parse LLM output into claims

use crate::classify::{classify_evidence_type, find_year, normalize_time_marker};
use crate::error::ExtractorError;
use crate::types::ExtractionFailure;
use plutarch_domain::{
    AttributeType, ChunkClaims, Claim, ClaimId, ClaimValue, Confidence, EventClaim, EventKind,
    SourceChunk, TimeSpan,
};
use serde_json::{Map, Value};
use tracing::warn;

/// Claims parsed from one response, plus the entries that were skipped
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// Parsed claims
    pub claims: ChunkClaims,
    /// Skipped entries
    pub failures: Vec<ExtractionFailure>,
    /// Entries found, parsed or not
    pub total_entries: usize,
}

/// Parse an LLM response for one chunk
///
/// Accepts `{"events": [...], "facts": [...]}` (also `career_events`), or a
/// bare array of events. Individually malformed entries are skipped.
pub fn parse_llm_response(
    response: &str,
    chunk: &SourceChunk,
) -> Result<ParsedResponse, ExtractorError> {
    let json: Value = plutarch_llm::parse_json(response)
        .map_err(|e| ExtractorError::InvalidFormat(e.to_string()))?;

    let (events, facts) = match &json {
        Value::Array(items) => (items.as_slice(), &[][..]),
        Value::Object(obj) => {
            let events = obj.get("events").or_else(|| obj.get("career_events"));
            let facts = obj.get("facts");
            if events.is_none() && facts.is_none() {
                return Err(ExtractorError::InvalidFormat(
                    "Expected an 'events' or 'facts' array".to_string(),
                ));
            }
            (array_or_empty(events)?, array_or_empty(facts)?)
        }
        _ => {
            return Err(ExtractorError::InvalidFormat(
                "Expected JSON object or array".to_string(),
            ))
        }
    };

    let mut claims = ChunkClaims::empty(chunk.source_id.clone());
    let mut failures = Vec::new();

    for (idx, entry) in events.iter().enumerate() {
        match parse_event(entry, chunk, idx) {
            Ok(event) => claims.events.push(event),
            Err(e) => {
                warn!("Failed to parse event {} in {}: {}", idx, chunk.source_id, e);
                failures.push(ExtractionFailure {
                    reason: e,
                    raw_text: entry.to_string(),
                });
            }
        }
    }

    for (idx, entry) in facts.iter().enumerate() {
        match parse_fact(entry, chunk, idx) {
            Ok(fact) => claims.facts.push(fact),
            Err(e) => {
                warn!("Failed to parse fact {} in {}: {}", idx, chunk.source_id, e);
                failures.push(ExtractionFailure {
                    reason: e,
                    raw_text: entry.to_string(),
                });
            }
        }
    }

    Ok(ParsedResponse {
        claims,
        failures,
        total_entries: events.len() + facts.len(),
    })
}

fn array_or_empty(value: Option<&Value>) -> Result<&[Value], ExtractorError> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(ExtractorError::InvalidFormat(format!(
            "Expected array, got {}",
            other
        ))),
    }
}

fn parse_event(json: &Value, chunk: &SourceChunk, idx: usize) -> Result<EventClaim, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Event is not a JSON object".to_string())?;

    let kind = match optional_str(obj, "kind")?.map(|k| k.to_ascii_lowercase()) {
        None => EventKind::CareerPosition,
        Some(k) if k == "award" => EventKind::Award,
        Some(k) if k == "career_position" || k == "career" || k == "position" => {
            EventKind::CareerPosition
        }
        Some(k) => return Err(format!("Unknown event kind '{}'", k)),
    };

    let organization = optional_str(obj, "organization")?
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let roles = string_list(obj, "roles", "role")?;
    let locations = string_list(obj, "locations", "location")?;

    let time_period = optional_str(obj, "time_period")?.map(str::to_string);
    let time = match &time_period {
        Some(marker) => normalize_time_marker(marker),
        None => TimeSpan {
            start: optional_year(obj, "start_year")?,
            end: optional_year(obj, "end_year")?,
        },
    };

    let quote = optional_str(obj, "quote")?
        .or(optional_str(obj, "evidence_quote")?)
        .unwrap_or_default()
        .to_string();

    let confidence = optional_str(obj, "confidence")?
        .and_then(Confidence::parse)
        .unwrap_or_default();

    Ok(EventClaim {
        claim_id: ClaimId::new(format!("{}:e{}", chunk.source_id, idx + 1)),
        source_id: chunk.source_id.clone(),
        source_domain: chunk.source_domain.clone(),
        kind,
        organization,
        roles,
        locations,
        time,
        time_markers: time_period.into_iter().collect(),
        evidence_type: classify_evidence_type(&quote),
        evidence_quote: quote,
        confidence,
    })
}

fn parse_fact(json: &Value, chunk: &SourceChunk, idx: usize) -> Result<Claim, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Fact is not a JSON object".to_string())?;

    let attribute = optional_str(obj, "attribute")?
        .unwrap_or("birth_year")
        .to_string();

    let raw_value = match obj.get("value") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => {
            let year = n
                .as_i64()
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| format!("Value {} is not a year", n))?;
            Some(ClaimValue::Year(year))
        }
        Some(Value::String(s)) => match find_year(s) {
            Some(year) if attribute.ends_with("year") => Some(ClaimValue::Year(year)),
            _ if s.trim().is_empty() => None,
            _ => Some(ClaimValue::Text(s.trim().to_string())),
        },
        Some(other) => return Err(format!("Unsupported fact value {}", other)),
    };

    let quote = optional_str(obj, "quote")?.unwrap_or_default().to_string();

    Ok(Claim {
        claim_id: ClaimId::new(format!("{}:f{}", chunk.source_id, idx + 1)),
        source_id: chunk.source_id.clone(),
        source_domain: chunk.source_domain.clone(),
        attribute_type: AttributeType::ScalarFact,
        attribute: Some(attribute),
        raw_value,
        evidence_type: classify_evidence_type(&quote),
        evidence_quote: quote,
    })
}

fn optional_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(format!("Invalid '{}': expected string", key)),
    }
}

fn optional_year(obj: &Map<String, Value>, key: &str) -> Result<Option<i32>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(Some)
            .ok_or_else(|| format!("Invalid '{}': not a year", key)),
        Some(Value::String(s)) => Ok(find_year(s)),
        Some(_) => Err(format!("Invalid '{}': expected year", key)),
    }
}

fn string_list(
    obj: &Map<String, Value>,
    plural: &str,
    singular: &str,
) -> Result<Vec<String>, String> {
    let mut values = match obj.get(plural) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("Invalid '{}': expected strings", plural))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::String(s)) => vec![s.clone()],
        Some(_) => return Err(format!("Invalid '{}': expected array", plural)),
    };
    if let Some(single) = optional_str(obj, singular)? {
        values.push(single.to_string());
    }
    values.retain(|v| !v.trim().is_empty());
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plutarch_domain::EvidenceType;

    fn chunk() -> SourceChunk {
        SourceChunk {
            source_id: "doc-1".to_string(),
            source_domain: "who.int".to_string(),
            text: String::new(),
        }
    }

    #[test]
    fn test_parse_events_and_facts() {
        let response = r#"{
            "events": [
                {
                    "kind": "career_position",
                    "organization": "WHO",
                    "roles": ["Director-General"],
                    "locations": ["Geneva"],
                    "time_period": "2007-2017",
                    "quote": "She served as Director-General of WHO from 2007 to 2017.",
                    "confidence": "high"
                }
            ],
            "facts": [
                {"attribute": "birth_year", "value": 1947, "quote": "Born in 1947 in Hong Kong"}
            ]
        }"#;

        let parsed = parse_llm_response(response, &chunk()).unwrap();
        assert_eq!(parsed.total_entries, 2);
        assert!(parsed.failures.is_empty());

        let event = &parsed.claims.events[0];
        assert_eq!(event.claim_id.as_str(), "doc-1:e1");
        assert_eq!(event.organization.as_deref(), Some("WHO"));
        assert_eq!(event.time, TimeSpan::range(2007, 2017));
        assert_eq!(event.time_markers, vec!["2007-2017"]);
        assert_eq!(event.confidence, Confidence::High);
        assert_eq!(event.source_domain, "who.int");

        let fact = &parsed.claims.facts[0];
        assert_eq!(fact.raw_value, Some(ClaimValue::Year(1947)));
        assert_eq!(fact.evidence_type, EvidenceType::Narrative);
        assert_eq!(fact.attribute.as_deref(), Some("birth_year"));
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = "```json\n[{\"organization\": \"World Bank\", \"role\": \"Economist\"}]\n```";
        let parsed = parse_llm_response(response, &chunk()).unwrap();
        assert_eq!(parsed.claims.events.len(), 1);
        assert_eq!(parsed.claims.events[0].roles, vec!["Economist"]);
    }

    #[test]
    fn test_career_events_key_accepted() {
        let response = r#"{"career_events": [{"organization": "UNICEF", "start_year": 1990}]}"#;
        let parsed = parse_llm_response(response, &chunk()).unwrap();
        assert_eq!(parsed.claims.events[0].time.start, Some(1990));
        assert_eq!(parsed.claims.events[0].time.end, None);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_llm_response("This is not JSON", &chunk());
        assert!(matches!(result, Err(ExtractorError::InvalidFormat(_))));
    }

    #[test]
    fn test_object_without_known_keys() {
        let result = parse_llm_response(r#"{"answer": 42}"#, &chunk());
        assert!(matches!(result, Err(ExtractorError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_partial_success() {
        let response = r#"{"events": [
            {"organization": "WHO", "roles": ["Director-General"]},
            "not an object",
            {"organization": "UNICEF", "roles": "Deputy Director"},
            {"organization": 7}
        ]}"#;

        let parsed = parse_llm_response(response, &chunk()).unwrap();
        assert_eq!(parsed.claims.events.len(), 2);
        assert_eq!(parsed.failures.len(), 2);
        assert_eq!(parsed.claims.events[1].claim_id.as_str(), "doc-1:e3");
    }

    #[test]
    fn test_fact_string_values() {
        let response = r#"{"facts": [
            {"value": "c. 1950", "quote": "Date of birth: c. 1950"},
            {"value": null, "quote": "birth date unknown"},
            {"attribute": "birth_place", "value": "Lyon", "quote": "born in Lyon"}
        ]}"#;

        let parsed = parse_llm_response(response, &chunk()).unwrap();
        let facts = &parsed.claims.facts;
        assert_eq!(facts[0].raw_value, Some(ClaimValue::Year(1950)));
        assert_eq!(facts[0].evidence_type, EvidenceType::ExplicitField);
        assert_eq!(facts[1].raw_value, None);
        assert_eq!(facts[2].raw_value, Some(ClaimValue::Text("Lyon".to_string())));
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let response = r#"{"events": [{"kind": "hobby", "organization": "Chess Club"}]}"#;
        let parsed = parse_llm_response(response, &chunk()).unwrap();
        assert!(parsed.claims.events.is_empty());
        assert_eq!(parsed.failures.len(), 1);
    }
}
