//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{CompletionRequest, LlmProvider};
use super::retry::{status_error, RetryPolicy};

/// Client for `POST {base_url}/chat/completions`
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client from configuration
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            retry: RetryPolicy::from_config(config),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::LlmRejected("no API key configured".into()))
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::llm("Completion response had no content"))
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        tracing::debug!(
            task = %request.task,
            model = %self.model,
            max_tokens = request.max_tokens,
            "Requesting completion"
        );
        self.retry.retry(|| self.send_once(request)).await
    }

    async fn health_check(&self) -> Result<bool> {
        let Ok(key) = self.api_key() else {
            return Ok(false);
        };
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ExtractionTask;

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-2024-08-06",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "Du er en HR-assistent.",
                },
                ChatMessage {
                    role: "user",
                    content: "Tekst",
                },
            ],
            max_tokens: 100,
            temperature: 0.3,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Tekst");
        assert_eq!(value["max_tokens"], 100);
    }

    #[test]
    fn test_response_parsing() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  lønn, ferie  "}}]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("  lønn, ferie  ")
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected_without_request() {
        let client = OpenAiClient::new(&LlmConfig::default()).unwrap();
        let request = CompletionRequest {
            task: ExtractionTask::Keywords,
            system: String::new(),
            prompt: "Tekst".into(),
            max_tokens: 10,
        };
        let result = client.complete(&request).await;
        assert!(matches!(result, Err(Error::LlmRejected(_))));
        assert!(!client.health_check().await.unwrap());
    }
}
