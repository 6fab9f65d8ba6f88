//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use plutarch_extractor::ExtractorConfig;
use plutarch_gatekeeper::ValidationConfig;
use plutarch_reconciler::{ReconcilerConfig, RuleCanonicalizer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration, read from `plutarch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Reconciliation thresholds and consensus policy
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Chunk extraction limits
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Boundary validation of extracted claims
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Which capability provider to use
    #[serde(default)]
    pub llm: LlmSettings,

    /// Canonical name to aliases, used by the rules provider
    #[serde(default)]
    pub aliases: RuleCanonicalizer,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Capability provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Offline alias table and similarity rules
    #[default]
    Rules,
    /// Local Ollama server
    Ollama,
}

/// LLM provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider kind
    #[serde(default)]
    pub provider: ProviderKind,

    /// Provider endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name; required for `ollama`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Config {
    /// Default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".plutarch").join("plutarch.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise. The result is validated.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(Path::new(path))?,
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without validating it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> Result<()> {
        self.reconciler
            .validate()
            .map_err(|e| CliError::Config(format!("[reconciler] {}", e)))?;
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.validation
            .validate()
            .map_err(|e| CliError::Config(format!("[validation] {}", e)))?;

        if self.llm.provider == ProviderKind::Ollama
            && self.llm.model.as_deref().is_none_or(|m| m.trim().is_empty())
        {
            return Err(CliError::Config(
                "[llm] provider \"ollama\" requires a model".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Rules,
            endpoint: default_endpoint(),
            model: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_endpoint() -> String {
    plutarch_llm::ollama::DEFAULT_ENDPOINT.to_string()
}
