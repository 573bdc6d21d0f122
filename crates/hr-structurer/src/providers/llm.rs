//! LLM provider trait for field extraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Field an inference call is made for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionTask {
    Keywords,
    Category,
    Entities,
    Sentiment,
    Summary,
}

impl ExtractionTask {
    /// Extraction order within one document
    pub const ORDER: [ExtractionTask; 5] = [
        Self::Keywords,
        Self::Category,
        Self::Entities,
        Self::Sentiment,
        Self::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keywords => "keywords",
            Self::Category => "category",
            Self::Entities => "entities",
            Self::Sentiment => "sentiment",
            Self::Summary => "summary",
        }
    }
}

impl std::fmt::Display for ExtractionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded prompt submitted to the inference service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub task: ExtractionTask,
    /// System instruction
    pub system: String,
    /// User prompt containing the document excerpt
    pub prompt: String,
    /// Ceiling on generated tokens
    pub max_tokens: u32,
}

/// Trait for LLM-based text completion
///
/// Implementations:
/// - `OpenAiClient`: OpenAI-compatible chat completions API
/// - `OllamaClient`: local Ollama server
/// - `CachedLlm`: in-memory cache around another provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt and return the trimmed response text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
