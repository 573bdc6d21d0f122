//! Inference provider abstractions
//!
//! Field extraction talks to a single `LlmProvider`. Backends are selected in
//! configuration and optionally wrapped in an in-memory completion cache.

pub mod cache;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod retry;

use std::sync::Arc;

use crate::config::{LlmBackend, StructurerConfig};
use crate::error::Result;

pub use cache::{CacheStats, CachedLlm};
pub use llm::{CompletionRequest, ExtractionTask, LlmProvider};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use retry::RetryPolicy;

/// Providers built from configuration
pub struct ProviderSet {
    /// Provider used for extraction (cached when enabled)
    pub llm: Arc<dyn LlmProvider>,
    /// The cache layer, for statistics
    pub cache: Option<Arc<CachedLlm>>,
}

/// Build the configured inference provider
pub fn build_provider(config: &StructurerConfig) -> Result<ProviderSet> {
    let backend: Arc<dyn LlmProvider> = match config.llm.backend {
        LlmBackend::OpenAi => {
            if config.llm.api_key.is_none() {
                tracing::warn!("No API key configured; inference calls will be rejected");
            }
            Arc::new(OpenAiClient::new(&config.llm)?)
        }
        LlmBackend::Ollama => Arc::new(OllamaClient::new(&config.llm)?),
    };

    tracing::info!(
        "Inference provider: {} (model: {})",
        backend.name(),
        backend.model()
    );

    if !config.cache.enabled {
        return Ok(ProviderSet {
            llm: backend,
            cache: None,
        });
    }

    let cache = Arc::new(CachedLlm::from_config(backend, &config.cache));
    Ok(ProviderSet {
        llm: cache.clone(),
        cache: Some(cache),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ollama_with_cache() {
        let mut config = StructurerConfig::default();
        config.llm.backend = LlmBackend::Ollama;
        config.llm.model = "llama3.2:3b".into();

        let providers = build_provider(&config).unwrap();
        assert_eq!(providers.llm.name(), "ollama");
        assert_eq!(providers.llm.model(), "llama3.2:3b");
        assert!(providers.cache.is_some());
    }

    #[test]
    fn test_build_without_cache() {
        let mut config = StructurerConfig::default();
        config.cache.enabled = false;

        let providers = build_provider(&config).unwrap();
        assert_eq!(providers.llm.name(), "openai");
        assert!(providers.cache.is_none());
    }
}
