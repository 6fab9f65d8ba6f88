//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use crate::prompt::PromptBuilder;
use crate::types::{
    BatchItem, BatchReport, ChunkExtraction, ExtractionFailure, ExtractionMetadata, ItemStatus,
};
use plutarch_domain::traits::{Extractor, LlmProvider};
use plutarch_domain::{ChunkClaims, SourceChunk};
use plutarch_gatekeeper::Gatekeeper;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// LLM-backed extractor turning source chunks into event and fact claims
pub struct LlmExtractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    gatekeeper: Gatekeeper,
    config: ExtractorConfig,
    model_name: String,
    person: Option<String>,
}

impl<L> LlmExtractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a new extractor
    ///
    /// Fails when the configuration is invalid.
    pub fn new(
        llm_provider: L,
        gatekeeper: Gatekeeper,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            llm_provider: Arc::new(llm_provider),
            gatekeeper,
            config,
            model_name: "llm".to_string(),
            person: None,
        })
    }

    /// Create a new extractor with a specific model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Name the person every chunk is about
    pub fn with_person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract claims from one chunk (blocking)
    pub fn extract_chunk(&self, chunk: &SourceChunk) -> Result<ChunkExtraction, ExtractorError> {
        if chunk.text.len() > self.config.max_chunk_length {
            return Err(ExtractorError::ChunkTooLong(
                chunk.text.len(),
                self.config.max_chunk_length,
            ));
        }

        let start = Instant::now();

        let mut builder = PromptBuilder::new(chunk.text.as_str(), chunk.source_domain.as_str());
        if let Some(person) = &self.person {
            builder = builder.with_person(person.as_str());
        }
        let prompt = builder.build();

        debug!("Prompt length: {} chars", prompt.len());

        let response = self
            .llm_provider
            .generate(&prompt)
            .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        debug!("LLM response length: {} chars", response.len());

        let parsed = parse_llm_response(&response, chunk)?;
        let mut failures = parsed.failures;

        // Gatekeeper at the boundary
        let mut claims = ChunkClaims::empty(chunk.source_id.clone());
        for event in parsed.claims.events {
            let verdict = self.gatekeeper.validate_event(&event, &claims.events);
            if verdict.is_usable() {
                claims.events.push(event);
            } else {
                failures.push(ExtractionFailure {
                    reason: format!("Validation failed: {:?}", verdict.reasons),
                    raw_text: event.evidence_quote.clone(),
                });
            }
        }
        for fact in parsed.claims.facts {
            let verdict = self.gatekeeper.validate_fact(&fact);
            if verdict.is_usable() {
                claims.facts.push(fact);
            } else {
                failures.push(ExtractionFailure {
                    reason: format!("Validation failed: {:?}", verdict.reasons),
                    raw_text: fact.evidence_quote.clone(),
                });
            }
        }

        info!(
            "Extracted {} events, {} facts from {} ({} skipped)",
            claims.events.len(),
            claims.facts.len(),
            chunk.source_id,
            failures.len()
        );

        Ok(ChunkExtraction {
            claims,
            failures,
            metadata: ExtractionMetadata {
                source_id: chunk.source_id.clone(),
                model_name: self.model_name.clone(),
                total_entries: parsed.total_entries,
                processing_time_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    /// Extract a batch of chunks with bounded concurrency
    ///
    /// Each chunk is retried with exponential backoff up to `max_retries`
    /// attempts. A failed chunk is recorded in the report and never aborts
    /// the batch. Report rows follow input order.
    pub async fn extract_batch(self: Arc<Self>, chunks: Vec<SourceChunk>) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();
        let total = chunks.len();

        info!("Starting batch extraction of {} chunks", total);

        for (position, chunk) in chunks.into_iter().enumerate() {
            let extractor = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // Closed only when the semaphore is dropped, which cannot happen here
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = extractor.extract_with_retry(chunk).await;
                (position, outcome)
            });
        }

        let mut slots: Vec<Option<(BatchItem, Option<ChunkClaims>)>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, outcome)) => slots[position] = Some(outcome),
                Err(e) => warn!("Extraction task panicked: {}", e),
            }
        }

        let mut report = BatchReport::default();
        for slot in slots.into_iter().flatten() {
            let (item, claims) = slot;
            report.items.push(item);
            report.claims.extend(claims);
        }

        info!(
            "Batch complete: {} succeeded, {} failed, {} claims",
            report.succeeded(),
            report.failed(),
            report.total_claims()
        );

        report
    }

    async fn extract_with_retry(
        self: Arc<Self>,
        chunk: SourceChunk,
    ) -> (BatchItem, Option<ChunkClaims>) {
        let chunk = Arc::new(chunk);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.config.max_retries {
            attempts += 1;

            let extractor = Arc::clone(&self);
            let task_chunk = Arc::clone(&chunk);
            let call = tokio::task::spawn_blocking(move || extractor.extract_chunk(&task_chunk));

            let result = match timeout(self.config.extraction_timeout(), call).await {
                Err(_) => Err(ExtractorError::Timeout),
                Ok(Err(join)) => Err(ExtractorError::Llm(format!("Task join error: {}", join))),
                Ok(Ok(result)) => result,
            };

            match result {
                Ok(extraction) => {
                    let claims = extraction.claims;
                    return (
                        BatchItem {
                            source_id: chunk.source_id.clone(),
                            status: ItemStatus::Succeeded,
                            error: None,
                            attempts,
                            claim_count: claims.len(),
                        },
                        Some(claims),
                    );
                }
                Err(e) => {
                    let retryable = e.is_retryable();
                    warn!(
                        source_id = %chunk.source_id,
                        attempt = attempts,
                        retryable,
                        "Chunk extraction failed: {}",
                        e
                    );
                    last_error = Some(e.to_string());
                    if !retryable {
                        break;
                    }
                    if attempts < self.config.max_retries {
                        tokio::time::sleep(self.config.backoff(attempts)).await;
                    }
                }
            }
        }

        (
            BatchItem {
                source_id: chunk.source_id.clone(),
                status: ItemStatus::Failed,
                error: last_error,
                attempts,
                claim_count: 0,
            },
            None,
        )
    }
}

impl<L> Extractor for LlmExtractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    type Error = ExtractorError;

    fn extract(&self, chunk: &SourceChunk) -> Result<ChunkClaims, Self::Error> {
        self.extract_chunk(chunk).map(|e| e.claims)
    }
}
