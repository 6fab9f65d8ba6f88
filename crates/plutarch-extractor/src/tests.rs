//! Batch extraction tests

#[cfg(test)]
mod tests {
    use crate::{ExtractorConfig, ItemStatus, LlmExtractor};
    use plutarch_domain::SourceChunk;
    use plutarch_gatekeeper::Gatekeeper;
    use plutarch_llm::MockProvider;
    use std::sync::Arc;

    const GOOD_RESPONSE: &str = r#"{
        "events": [
            {"organization": "WHO", "roles": ["Director-General"], "time_period": "2007-2017",
             "quote": "Director-General of the WHO from 2007 to 2017"}
        ],
        "facts": [
            {"attribute": "birth_year", "value": 1947, "quote": "born in 1947"}
        ]
    }"#;

    fn chunk(id: &str, text: &str) -> SourceChunk {
        SourceChunk {
            source_id: id.to_string(),
            source_domain: format!("{}.org", id),
            text: text.to_string(),
        }
    }

    fn fast_config() -> ExtractorConfig {
        ExtractorConfig {
            max_concurrency: 2,
            max_retries: 3,
            initial_backoff_ms: 1,
            extraction_timeout_secs: 5,
            max_chunk_length: 1_000,
        }
    }

    fn extractor(llm: MockProvider) -> Arc<LlmExtractor<MockProvider>> {
        Arc::new(LlmExtractor::new(llm, Gatekeeper::default_config(), fast_config()).unwrap())
    }

    #[tokio::test]
    async fn test_full_batch_flow() {
        let llm = MockProvider::new(GOOD_RESPONSE);
        let report = extractor(llm)
            .extract_batch(vec![chunk("a", "text a"), chunk("b", "text b")])
            .await;

        assert_eq!(report.items.len(), 2);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.total_claims(), 4);
        assert_eq!(report.items[0].source_id, "a");
        assert_eq!(report.items[1].source_id, "b");
        assert_eq!(report.claims[1].events[0].source_domain, "b.org");
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_abort_batch() {
        let mut llm = MockProvider::new(GOOD_RESPONSE);
        llm.add_error_containing("poison");

        let report = extractor(llm.clone())
            .extract_batch(vec![
                chunk("a", "fine"),
                chunk("b", "poison pill"),
                chunk("c", "fine too"),
            ])
            .await;

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);

        let failed = &report.items[1];
        assert_eq!(failed.source_id, "b");
        assert_eq!(failed.status, ItemStatus::Failed);
        assert_eq!(failed.attempts, 3);
        assert!(failed.error.as_deref().unwrap().contains("LLM error"));

        // Two successes plus three attempts for the poisoned chunk
        assert_eq!(llm.call_count(), 5);
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let mut llm = MockProvider::new(GOOD_RESPONSE);
        llm.push_response("ERROR");

        let report = extractor(llm.clone())
            .extract_batch(vec![chunk("a", "text")])
            .await;

        assert_eq!(report.items[0].status, ItemStatus::Succeeded);
        assert_eq!(report.items[0].attempts, 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unparsable_response_fails_without_retry() {
        let llm = MockProvider::new("I could not find anything, sorry.");
        let report = extractor(llm.clone())
            .extract_batch(vec![chunk("a", "text")])
            .await;

        assert_eq!(report.items[0].status, ItemStatus::Failed);
        assert_eq!(report.items[0].attempts, 1);
        assert!(report.claims.is_empty());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_oversized_chunk_is_reported() {
        let llm = MockProvider::new(GOOD_RESPONSE);
        let report = extractor(llm.clone())
            .extract_batch(vec![chunk("big", &"x".repeat(2_000))])
            .await;

        assert_eq!(report.items[0].status, ItemStatus::Failed);
        assert!(report.items[0].error.as_deref().unwrap().contains("too long"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = extractor(MockProvider::default()).extract_batch(Vec::new()).await;
        assert!(report.items.is_empty());
        assert_eq!(report.failed(), 0);
    }
}
