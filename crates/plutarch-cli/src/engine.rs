//! Capability wiring for the configured provider.

use crate::config::{Config, ProviderKind};
use crate::error::{CliError, Result};
use plutarch_domain::{Claim, ConsolidatedEvent, EventClaim, ScalarConsensus, SourceChunk};
use plutarch_extractor::LlmExtractor;
use plutarch_gatekeeper::Gatekeeper;
use plutarch_llm::OllamaProvider;
use plutarch_reconciler::{
    LlmCanonicalizer, LlmConsolidator, LlmMatchDecider, MergeOutcome, ReconcileRun, Reconciler,
    RuleCanonicalizer, RuleConsolidator, RuleMatchDecider, RunMetrics, ScanOutcome,
};
use std::sync::Arc;
use tracing::info;

type RuleReconciler = Reconciler<RuleCanonicalizer, RuleConsolidator, RuleMatchDecider>;
type OllamaReconciler = Reconciler<
    LlmCanonicalizer<OllamaProvider>,
    LlmConsolidator<OllamaProvider>,
    LlmMatchDecider<OllamaProvider>,
>;

/// Reconciler bound to the configured provider.
pub enum Engine {
    /// Offline rules
    Rules(RuleReconciler),
    /// Ollama-backed judgements, plus chunk extraction
    Ollama {
        /// Reconciler over the shared provider
        reconciler: OllamaReconciler,
        /// Extractor for `consensus --chunks`
        extractor: LlmExtractor<OllamaProvider>,
    },
}

impl Engine {
    /// Build the engine described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.llm.provider {
            ProviderKind::Rules => {
                info!("Using rules provider ({} aliases)", config.aliases.len());
                Ok(Self::Rules(Reconciler::with_rules(
                    config.aliases.clone(),
                    config.reconciler.clone(),
                )?))
            }
            ProviderKind::Ollama => {
                let model = config
                    .llm
                    .model
                    .as_deref()
                    .ok_or_else(|| CliError::Config("[llm] model is required".to_string()))?;
                info!("Using ollama provider at {} (model {})", config.llm.endpoint, model);

                let connect = || {
                    OllamaProvider::new(config.llm.endpoint.as_str(), model)
                        .map_err(|e| CliError::Config(e.to_string()))
                };
                let reconciler =
                    Reconciler::with_llm(Arc::new(connect()?), config.reconciler.clone())?;
                let gatekeeper = Gatekeeper::new(config.validation.clone())
                    .map_err(|e| CliError::Config(e.to_string()))?;
                let extractor =
                    LlmExtractor::new(connect()?, gatekeeper, config.extractor.clone())?
                        .with_model_name(model);

                Ok(Self::Ollama {
                    reconciler,
                    extractor,
                })
            }
        }
    }

    /// Resolve, group and arbitrate claims.
    pub fn reconcile(&mut self, claims: &[EventClaim]) -> ReconcileRun {
        match self {
            Self::Rules(r) => r.reconcile(claims),
            Self::Ollama { reconciler, .. } => reconciler.reconcile(claims),
        }
    }

    /// Scalar consensus over pre-extracted claims.
    pub fn consensus(&mut self, attribute: &str, claims: &[Claim]) -> ScalarConsensus {
        match self {
            Self::Rules(r) => r.consensus(attribute, claims),
            Self::Ollama { reconciler, .. } => reconciler.consensus(attribute, claims),
        }
    }

    /// Name the person extraction prompts are about.
    pub fn with_person(self, person: Option<&str>) -> Self {
        match (self, person) {
            (
                Self::Ollama {
                    reconciler,
                    extractor,
                },
                Some(person),
            ) => Self::Ollama {
                reconciler,
                extractor: extractor.with_person(person),
            },
            (engine, _) => engine,
        }
    }

    /// Extract chunks until the attribute's consensus is decisive.
    ///
    /// Needs an LLM provider; the rules provider cannot read text.
    pub fn scan(&mut self, chunks: &[SourceChunk], attribute: &str) -> Result<ScanOutcome> {
        match self {
            Self::Rules(_) => Err(CliError::Config(
                "chunk extraction requires [llm] provider = \"ollama\"".to_string(),
            )),
            Self::Ollama {
                reconciler,
                extractor,
            } => Ok(reconciler.scan(&*extractor, chunks, attribute)),
        }
    }

    /// Merge new claims into existing events.
    pub fn merge(
        &mut self,
        events: &mut Vec<ConsolidatedEvent>,
        claims: &[EventClaim],
    ) -> Vec<MergeOutcome> {
        match self {
            Self::Rules(r) => r.merge(events, claims),
            Self::Ollama { reconciler, .. } => reconciler.merge(events, claims),
        }
    }

    /// Metrics of everything run so far.
    pub fn metrics(&self) -> &RunMetrics {
        match self {
            Self::Rules(r) => r.metrics(),
            Self::Ollama { reconciler, .. } => reconciler.metrics(),
        }
    }
}
