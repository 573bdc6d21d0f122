//! Completion caching
//!
//! Identical prompts (same model, instruction, excerpt and token budget) are
//! answered from memory, so re-running a batch does not repeat paid calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::Result;

use super::llm::{CompletionRequest, LlmProvider};

/// Cached completion with metadata
#[derive(Debug, Clone)]
struct CachedCompletion {
    text: String,
    cached_at: DateTime<Utc>,
    hit_count: u32,
}

/// Provider decorator that caches successful completions
pub struct CachedLlm {
    inner: Arc<dyn LlmProvider>,
    /// Cache entries keyed by request hash
    cache: RwLock<HashMap<String, CachedCompletion>>,
    max_entries: usize,
    ttl_seconds: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedLlm {
    pub fn new(inner: Arc<dyn LlmProvider>, max_entries: usize, ttl_seconds: u64) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            max_entries,
            ttl_seconds,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(inner: Arc<dyn LlmProvider>, config: &CacheConfig) -> Self {
        Self::new(inner, config.max_entries, config.ttl_secs)
    }

    /// Hash a request for the cache key
    fn cache_key(model: &str, request: &CompletionRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0]);
        hasher.update(request.system.as_bytes());
        hasher.update([0]);
        hasher.update(request.prompt.as_bytes());
        hasher.update(request.max_tokens.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let mut cache = self.cache.write();
        let entry = cache.get_mut(key)?;

        let age = Utc::now().signed_duration_since(entry.cached_at);
        if age.num_seconds().max(0) as u64 > self.ttl_seconds {
            tracing::debug!("Cache miss (TTL expired): {}", &key[..12]);
            cache.remove(key);
            return None;
        }

        entry.hit_count += 1;
        tracing::debug!("Cache hit: {} (hits: {})", &key[..12], entry.hit_count);
        Some(entry.text.clone())
    }

    fn store(&self, key: String, text: String) {
        let mut cache = self.cache.write();
        if cache.len() >= self.max_entries && !cache.contains_key(&key) {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.cached_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }
        cache.insert(
            key,
            CachedCompletion {
                text,
                cached_at: Utc::now(),
                hit_count: 0,
            },
        );
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            max_entries: self.max_entries,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

#[async_trait]
impl LlmProvider for CachedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let key = Self::cache_key(self.inner.model(), request);

        if let Some(text) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(text);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let text = self.inner.complete(request).await?;
        if self.max_entries > 0 {
            self.store(key, text.clone());
        }
        Ok(text)
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

/// Cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub max_entries: usize,
    pub ttl_seconds: u64,
}
