//! Field extraction through the inference provider

use std::sync::Arc;

use crate::config::StructurerConfig;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{CompletionRequest, LlmProvider};
use crate::types::{Entities, FieldOutcome, HrCategory, SentimentKeywords};

use super::parse::{
    parse_category, parse_entities, parse_keywords, parse_sentiment, preview, truncate_words,
};

/// Runs the five field extractions for one document
pub struct FieldExtractor {
    llm: Arc<dyn LlmProvider>,
    prompts: PromptBuilder,
    keyword_count: usize,
    sentiment_keyword_limit: usize,
    summary_words: usize,
}

impl FieldExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &StructurerConfig) -> Self {
        Self {
            llm,
            prompts: PromptBuilder::new(config),
            keyword_count: config.processing.keyword_count,
            sentiment_keyword_limit: config.processing.sentiment_keyword_limit,
            summary_words: config.processing.summary_words,
        }
    }

    async fn call(&self, request: CompletionRequest) -> Result<String> {
        let task = request.task;
        let response = self.llm.complete(&request).await?;
        tracing::debug!(
            task = %task,
            response = %preview(&response, 100),
            "Model response"
        );
        Ok(response)
    }

    /// Up to `keyword_count` HR keywords
    pub async fn keywords(&self, text: &str) -> Result<Vec<String>> {
        let response = self.call(self.prompts.keywords(text)).await?;
        Ok(parse_keywords(&response, self.keyword_count))
    }

    /// Category from the closed set, `Other` when unrecognized
    pub async fn category(&self, text: &str) -> Result<FieldOutcome<HrCategory>> {
        let response = self.call(self.prompts.category(text)).await?;
        Ok(parse_category(&response))
    }

    /// Named entities; an unparsable response degrades to empty lists
    pub async fn entities(&self, text: &str) -> Result<FieldOutcome<Entities>> {
        let response = self.call(self.prompts.entities(text)).await?;
        Ok(parse_entities(&response))
    }

    /// Sentiment keywords; never fails
    pub async fn sentiment(&self, text: &str) -> FieldOutcome<SentimentKeywords> {
        match self.call(self.prompts.sentiment(text)).await {
            Ok(response) => {
                let outcome = parse_sentiment(&response, self.sentiment_keyword_limit);
                if let Some(reason) = outcome.reason() {
                    tracing::error!(
                        "Unexpected sentiment response ({}): {}",
                        reason,
                        preview(&response, 100)
                    );
                }
                outcome
            }
            Err(e) => {
                tracing::error!("Sentiment extraction failed: {}", e);
                FieldOutcome::degraded(SentimentKeywords::default(), e.to_string())
            }
        }
    }

    /// Summary of roughly `summary_words` words, capped at twice that
    pub async fn summary(&self, text: &str) -> Result<String> {
        let response = self.call(self.prompts.summary(text)).await?;
        Ok(truncate_words(&response, self.summary_words * 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::llm::MockLlmProvider;
    use crate::providers::ExtractionTask;
    use mockall::predicate::function;

    fn extractor(mock: MockLlmProvider) -> FieldExtractor {
        FieldExtractor::new(Arc::new(mock), &StructurerConfig::default())
    }

    #[tokio::test]
    async fn test_keywords_call_uses_budget() {
        let mut mock = MockLlmProvider::new();
        mock.expect_complete()
            .with(function(|req: &CompletionRequest| {
                req.task == ExtractionTask::Keywords && req.max_tokens == 100
            }))
            .times(1)
            .returning(|_| Ok("lønn, ferie, permisjon, arbeidstid, HMS, ekstra".to_string()));

        let keywords = extractor(mock).keywords("Tekst om lønn og ferie.").await.unwrap();
        assert_eq!(keywords, vec!["lønn", "ferie", "permisjon", "arbeidstid", "HMS"]);
    }

    #[tokio::test]
    async fn test_keywords_failure_propagates() {
        let mut mock = MockLlmProvider::new();
        mock.expect_complete()
            .returning(|_| Err(Error::llm("rate limited")));

        let result = extractor(mock).keywords("Tekst").await;
        assert!(matches!(result, Err(Error::Llm(_))));
    }

    #[tokio::test]
    async fn test_sentiment_failure_degrades() {
        let mut mock = MockLlmProvider::new();
        mock.expect_complete()
            .returning(|_| Err(Error::llm("timeout")));

        let outcome = extractor(mock).sentiment("Tekst").await;
        assert!(outcome.is_degraded());
        assert_eq!(outcome.into_value(), SentimentKeywords::default());
    }

    #[tokio::test]
    async fn test_summary_is_word_capped() {
        let mut config = StructurerConfig::default();
        config.processing.summary_words = 2;

        let mut mock = MockLlmProvider::new();
        mock.expect_complete()
            .with(function(|req: &CompletionRequest| req.max_tokens == 4))
            .returning(|_| Ok("En to tre fire fem seks.".to_string()));

        let extractor = FieldExtractor::new(Arc::new(mock), &config);
        assert_eq!(extractor.summary("Tekst").await.unwrap(), "En to tre fire");
    }

    #[tokio::test]
    async fn test_entities_raw_fallback() {
        let mut mock = MockLlmProvider::new();
        mock.expect_complete()
            .returning(|_| Ok("Ingen enheter funnet".to_string()));

        let outcome = extractor(mock).entities("Tekst").await.unwrap();
        assert!(outcome.is_degraded());
        assert_eq!(outcome.value().raw.as_deref(), Some("Ingen enheter funnet"));
    }
}
