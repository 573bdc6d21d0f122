//! Ollama client for local field extraction

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{CompletionRequest, LlmProvider};
use super::retry::{status_error, RetryPolicy};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn generate_once(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: &request.system,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;

        Ok(generated.response.trim().to_string())
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        tracing::debug!(task = %request.task, model = %self.model, "Generating with Ollama");
        self.retry.retry(|| self.generate_once(request)).await
    }

    /// Check if Ollama is available
    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_shape() {
        let body = GenerateRequest {
            model: "llama3.2:3b",
            prompt: "Tekst",
            system: "Svar kort.",
            stream: false,
            options: GenerateOptions {
                temperature: 0.3,
                num_predict: 50,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["system"], "Svar kort.");
        assert_eq!(value["options"]["num_predict"], 50);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:11434/".into(),
            ..LlmConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.name(), "ollama");
    }
}
