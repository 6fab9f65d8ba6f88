//! LLM prompt engineering for claim extraction

/// Builds prompts for the LLM to extract career events and facts
pub struct PromptBuilder {
    text: String,
    source_domain: String,
    person: Option<String>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(text: impl Into<String>, source_domain: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_domain: source_domain.into(),
            person: None,
        }
    }

    /// Name the person the text is about
    pub fn with_person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Instructions and output rules
        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Subject and source context
        if let Some(person) = &self.person {
            prompt.push_str(&format!("Person: {}\n", person));
        }
        prompt.push_str(&format!("Source: {}\n\n", self.source_domain));

        // 3. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        // 4. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"Extract every career position, award, and birth-year mention about the person from the following text.

Rules:
- One event per position or award; do not merge different positions
- Copy organization, role and location names exactly as written
- "time_period" is the verbatim time expression ("1990-1995", "since 2007"), or null if none
- "quote" is the exact sentence from the text that supports the entry
- Report a birth year only when the text states it; never infer it from age or career dates
- Use confidence "high" for definitive statements, "medium" for ordinary mentions, and "low" for hedged or indirect ones"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON object only, no additional text):
{
  "events": [
    {
      "kind": "career_position" or "award",
      "organization": "name or null",
      "roles": ["title"],
      "locations": ["place"],
      "time_period": "verbatim time expression or null",
      "quote": "exact text",
      "confidence": "low" | "medium" | "high"
    }
  ],
  "facts": [
    {
      "attribute": "birth_year",
      "value": 1950,
      "quote": "exact text"
    }
  ]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;
