//! Application state for the HTTP server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::StructurerConfig;
use crate::error::Result;
use crate::output::ArchiveBuilder;
use crate::processing::{BatchPipeline, JobQueue, ProcessingWorker};
use crate::providers::{build_provider, CacheStats, CachedLlm, LlmProvider};

/// Capacity of the job channel
const JOB_CHANNEL_CAPACITY: usize = 100;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: StructurerConfig,
    /// Inference provider used by the pipeline
    llm: Arc<dyn LlmProvider>,
    /// Completion cache, when enabled
    cache: Option<Arc<CachedLlm>>,
    /// Pipeline shared by the worker and synchronous structuring
    pipeline: Arc<BatchPipeline>,
    /// Job queue for background batches
    job_queue: Arc<JobQueue>,
    archive: ArchiveBuilder,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state from configuration and start the worker
    pub async fn new(config: StructurerConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");
        let providers = build_provider(&config)?;
        Ok(Self::from_parts(config, providers.llm, providers.cache))
    }

    /// Create application state around an existing provider
    pub fn with_provider(config: StructurerConfig, llm: Arc<dyn LlmProvider>) -> Self {
        Self::from_parts(config, llm, None)
    }

    fn from_parts(
        config: StructurerConfig,
        llm: Arc<dyn LlmProvider>,
        cache: Option<Arc<CachedLlm>>,
    ) -> Self {
        let pipeline = Arc::new(BatchPipeline::new(Arc::clone(&llm), &config));
        let (job_queue, receiver) = JobQueue::new(JOB_CHANNEL_CAPACITY);
        let job_queue = Arc::new(job_queue);

        let worker = ProcessingWorker::new(Arc::clone(&pipeline), Arc::clone(&job_queue));
        tokio::spawn(worker.run(receiver));

        let archive = ArchiveBuilder::new(&config.archive);
        tracing::info!("Application state initialized");

        Self {
            inner: Arc::new(AppStateInner {
                config,
                llm,
                cache,
                pipeline,
                job_queue,
                archive,
                ready: RwLock::new(true),
            }),
        }
    }

    pub fn config(&self) -> &StructurerConfig {
        &self.inner.config
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    pub fn pipeline(&self) -> &Arc<BatchPipeline> {
        &self.inner.pipeline
    }

    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    pub fn archive(&self) -> &ArchiveBuilder {
        &self.inner.archive
    }

    /// Completion cache statistics, when caching is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.inner.cache.as_ref().map(|cache| cache.stats())
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
