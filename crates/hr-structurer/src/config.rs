//! Configuration for the HR document structurer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variables consulted for the inference API key, in order
const API_KEY_ENV_VARS: [&str; 2] = ["HR_STRUCTURER_API_KEY", "OPENAI_API_KEY"];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructurerConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Inference service configuration
    pub llm: LlmConfig,
    /// Batch processing configuration
    pub processing: ProcessingConfig,
    /// Completion cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Archive output configuration
    pub archive: ArchiveConfig,
}

impl StructurerConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Render configuration as TOML (the API key is never included)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = API_KEY_ENV_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty());
        }
        if let Ok(model) = std::env::var("HR_STRUCTURER_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("HR_STRUCTURER_LLM_URL") {
            self.llm.base_url = url;
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(Error::Config("llm.model must not be empty".into()));
        }
        if self.llm.max_tokens == 0 {
            return Err(Error::Config("llm.max_tokens must be positive".into()));
        }
        if self.llm.backoff_min_secs > self.llm.backoff_max_secs {
            return Err(Error::Config(
                "llm.backoff_min_secs must not exceed llm.backoff_max_secs".into(),
            ));
        }
        if self.processing.max_file_size == 0 {
            return Err(Error::Config("processing.max_file_size must be positive".into()));
        }
        if self.processing.keyword_count == 0 || self.processing.summary_words == 0 {
            return Err(Error::Config(
                "processing.keyword_count and processing.summary_words must be positive".into(),
            ));
        }
        if self.processing.sentiment_keyword_limit == 0 {
            return Err(Error::Config(
                "processing.sentiment_keyword_limit must be positive".into(),
            ));
        }
        if self.archive.max_entry_name_len == 0 {
            return Err(Error::Config("archive.max_entry_name_len must be positive".into()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum multipart request size in bytes (default: 100MB)
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_request_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Inference backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// Inference service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which API flavour to speak
    pub backend: LlmBackend,
    /// API base URL
    pub base_url: String,
    /// API key (read from the environment, never written out)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Ceiling on generated tokens per call
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries after the first failed attempt
    pub max_retries: u32,
    /// Lower bound for the backoff delay
    pub backoff_min_secs: u64,
    /// Upper bound for the backoff delay
    pub backoff_max_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-2024-08-06".to_string(),
            max_tokens: 4000,
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 2, // three attempts in total
            backoff_min_secs: 4,
            backoff_max_secs: 10,
        }
    }
}

impl LlmConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Per-file size ceiling in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Target summary length in words
    pub summary_words: usize,
    /// Number of keywords kept per document
    pub keyword_count: usize,
    /// Maximum keywords kept per sentiment polarity
    pub sentiment_keyword_limit: usize,
    /// Leading non-blank lines inspected for a source URL
    pub url_scan_lines: usize,
    /// Characters of text sent for keywords and category
    pub short_input_chars: usize,
    /// Characters of text sent for entities, sentiment and summary
    pub long_input_chars: usize,
    /// Pause between files so progress consumers can refresh
    pub yield_interval_ms: u64,
    /// Language the documents are expected to be written in
    pub expected_language: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            summary_words: 200,
            keyword_count: 5,
            sentiment_keyword_limit: 5,
            url_scan_lines: 3,
            short_input_chars: 1000,
            long_input_chars: 2000,
            yield_interval_ms: 100,
            expected_language: "no".to_string(),
        }
    }
}

impl ProcessingConfig {
    /// Pause between files
    pub fn yield_interval(&self) -> Duration {
        Duration::from_millis(self.yield_interval_ms)
    }
}

/// Completion cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache identical prompts in memory
    pub enabled: bool,
    /// Entry time-to-live in seconds
    pub ttl_secs: u64,
    /// Maximum number of cached completions
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_entries: 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Optional log file, written in addition to stdout
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
        }
    }
}

/// Archive output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Download filename of the archive
    pub file_name: String,
    /// Strip path and special characters from entry names
    pub sanitize_names: bool,
    /// Maximum entry name length before the `.json` suffix
    pub max_entry_name_len: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            file_name: "alle_dokumentresultater.zip".to_string(),
            sanitize_names: true,
            max_entry_name_len: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StructurerConfig::default();
        assert_eq!(config.processing.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.llm.model, "gpt-4o-2024-08-06");
        assert_eq!(config.llm.max_tokens, 4000);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StructurerConfig::from_toml(
            r#"
            [llm]
            backend = "ollama"
            model = "llama3.2:3b"

            [processing]
            max_file_size = 2048
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.backend, LlmBackend::Ollama);
        assert_eq!(config.llm.model, "llama3.2:3b");
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.processing.max_file_size, 2048);
        assert_eq!(config.processing.summary_words, 200);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = StructurerConfig::default();
        config.llm.api_key = Some("sk-secret".to_string());
        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("gpt-4o-2024-08-06"));
    }

    #[test]
    fn test_validation_rejects_zero_ceiling() {
        let mut config = StructurerConfig::default();
        config.processing.max_file_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = StructurerConfig::default();
        config.llm.backoff_min_secs = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_sentiment_limit() {
        let mut config = StructurerConfig::default();
        config.processing.sentiment_keyword_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sentiment_keyword_limit"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("structurer.toml");
        std::fs::write(&path, "[archive]\nfile_name = \"batch.zip\"\n").unwrap();

        let config = StructurerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.archive.file_name, "batch.zip");
        assert!(config.archive.sanitize_names);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = StructurerConfig::load(Some(Path::new("/nonexistent/structurer.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
