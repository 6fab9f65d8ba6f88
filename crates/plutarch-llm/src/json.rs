//! Tolerant JSON recovery from model output
//!
//! Models wrap JSON in markdown fences, prepend prose, or append commentary.
//! These helpers find the payload and leave interpretation to the caller.

use serde::de::DeserializeOwned;

use crate::LlmError;

/// Extract the JSON payload from a model response
///
/// Strips a markdown code fence if present, then returns the span from the
/// first `{` or `[` to the last matching closer.
///
/// # Examples
///
/// ```
/// use plutarch_llm::extract_json;
///
/// let raw = "Sure! Here you go:\n```json\n{\"a\": 1}\n```";
/// assert_eq!(extract_json(raw), Some("{\"a\": 1}"));
/// assert_eq!(extract_json("no json here"), None);
/// ```
pub fn extract_json(response: &str) -> Option<&str> {
    let body = strip_fence(response);
    let object = body.find('{');
    let array = body.find('[');

    match (object, array) {
        (Some(o), Some(a)) if a < o => outermost(body, '[', ']').or_else(|| outermost(body, '{', '}')),
        (Some(_), _) => outermost(body, '{', '}').or_else(|| outermost(body, '[', ']')),
        (None, Some(_)) => outermost(body, '[', ']'),
        (None, None) => None,
    }
}

/// Extract and deserialize a JSON payload
///
/// Tries the whole (fence-stripped) body first, then the outermost object,
/// then the outermost array.
pub fn parse_json<T: DeserializeOwned>(response: &str) -> Result<T, LlmError> {
    let body = strip_fence(response);
    let candidates = [
        Some(body),
        extract_json(response),
        outermost(body, '{', '}'),
        outermost(body, '[', ']'),
    ];

    let mut last_error = None;
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) if body.contains(['{', '[']) => {
            LlmError::InvalidResponse(format!("malformed JSON: {}", e))
        }
        _ => LlmError::InvalidResponse("no JSON payload found".to_string()),
    })
}

fn strip_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    // Skip the language tag on the opening line
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
