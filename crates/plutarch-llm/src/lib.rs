//! Plutarch LLM Provider Layer
//!
//! Pluggable implementations of the `LlmProvider` trait from
//! `plutarch-domain`, plus helpers for recovering JSON from model output.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use plutarch_llm::MockProvider;
//! use plutarch_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod json;
pub mod ollama;

use plutarch_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

pub use error::LlmError;
pub use json::{extract_json, parse_json};
pub use ollama::OllamaProvider;

const ERROR_SENTINEL: &str = "ERROR";

#[derive(Debug, Default)]
struct MockState {
    exact: HashMap<String, String>,
    containing: Vec<(String, String)>,
    queue: VecDeque<String>,
    call_count: usize,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Responses are resolved in this order: an exact prompt match, the first
/// registered fragment the prompt contains, the next queued response, and
/// finally the default response. A scripted response of `"ERROR"` makes the
/// call fail.
///
/// # Examples
///
/// ```
/// use plutarch_llm::MockProvider;
/// use plutarch_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Multiple responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_response_containing("Geneva", "response2");
/// assert_eq!(provider.generate("prompt1").unwrap(), "response1");
/// assert_eq!(provider.generate("based in Geneva").unwrap(), "response2");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.lock().exact.insert(prompt.into(), response.into());
    }

    /// Add a response for any prompt containing `fragment`
    pub fn add_response_containing(
        &mut self,
        fragment: impl Into<String>,
        response: impl Into<String>,
    ) {
        self.lock()
            .containing
            .push((fragment.into(), response.into()));
    }

    /// Queue a response for the next unmatched call
    pub fn push_response(&mut self, response: impl Into<String>) {
        self.lock().queue.push_back(response.into());
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.add_response(prompt, ERROR_SENTINEL);
    }

    /// Configure to return an error for any prompt containing `fragment`
    pub fn add_error_containing(&mut self, fragment: impl Into<String>) {
        self.add_response_containing(fragment, ERROR_SENTINEL);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().call_count
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.lock().call_count = 0;
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let mut state = self.lock();
        state.call_count += 1;
        state.prompts.push(prompt.to_string());

        let mut scripted = state.exact.get(prompt).cloned();
        if scripted.is_none() {
            scripted = state
                .containing
                .iter()
                .find(|(fragment, _)| prompt.contains(fragment.as_str()))
                .map(|(_, response)| response.clone());
        }
        if scripted.is_none() {
            scripted = state.queue.pop_front();
        }

        match scripted {
            Some(response) if response == ERROR_SENTINEL => {
                Err(LlmError::Other("Mock error".to_string()))
            }
            Some(response) => Ok(response),
            None => Ok(self.default_response.clone()),
        }
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}
