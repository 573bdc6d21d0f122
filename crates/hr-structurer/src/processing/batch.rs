//! Sequential batch pipeline with per-file failure isolation

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::StructurerConfig;
use crate::error::{Error, Result};
use crate::ingestion::{FileParser, TextDecoder};
use crate::providers::LlmProvider;
use crate::types::{BatchResult, FileOutcome, FileStatus, StructureReport, UploadedFile};

use super::progress::{CancellationFlag, ProgressReporter, ProgressTracker};
use super::structurer::{derive_title, DocumentStructurer};

/// Processes uploaded files one at a time, in input order
pub struct BatchPipeline {
    decoder: Arc<dyn TextDecoder>,
    structurer: DocumentStructurer,
    max_file_size: u64,
    yield_interval: Duration,
}

impl BatchPipeline {
    /// Create a pipeline with the default decoder and language detector
    pub fn new(llm: Arc<dyn LlmProvider>, config: &StructurerConfig) -> Self {
        Self::with_parts(
            Arc::new(FileParser::new()),
            DocumentStructurer::new(llm, config),
            config,
        )
    }

    pub fn with_parts(
        decoder: Arc<dyn TextDecoder>,
        structurer: DocumentStructurer,
        config: &StructurerConfig,
    ) -> Self {
        Self {
            decoder,
            structurer,
            max_file_size: config.processing.max_file_size,
            yield_interval: config.processing.yield_interval(),
        }
    }

    /// Per-file size ceiling in bytes
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check, decode and structure a single file
    pub async fn structure_file(&self, file: &UploadedFile) -> Result<StructureReport> {
        if file.size > self.max_file_size {
            return Err(Error::FileTooLarge {
                filename: file.name.clone(),
                size: file.size,
                limit: self.max_file_size,
            });
        }

        let media_type = file
            .accepted_type()
            .ok_or_else(|| Error::UnsupportedFileType(file.media_type.clone()))?;

        let decoder = Arc::clone(&self.decoder);
        let name = file.name.clone();
        let data = file.data.clone();
        let text = tokio::task::spawn_blocking(move || decoder.decode(media_type, &name, &data))
            .await
            .map_err(|e| Error::internal(format!("Decoder task failed: {}", e)))??;

        if text.trim().is_empty() {
            return Err(Error::EmptyContent(file.name.clone()));
        }

        self.structurer.structure(&text, &file.name).await
    }

    /// Process one file into an outcome and, on success, the serialized record
    async fn process_file(&self, file: &UploadedFile) -> (FileOutcome, Option<String>) {
        let started = Instant::now();
        let mut outcome = FileOutcome {
            filename: file.name.clone(),
            title: derive_title(&file.name),
            status: FileStatus::Processed,
            message: None,
            elapsed_ms: 0,
            degraded_fields: Vec::new(),
            language: None,
        };

        let result = self
            .structure_file(file)
            .await
            .and_then(|report| Ok((serde_json::to_string(&report.document)?, report)));

        let json = match result {
            Ok((json, report)) => {
                outcome.degraded_fields = report.degraded_fields();
                outcome.language = report.language;
                if report.language_warning {
                    outcome.message = Some("Document may not be in the expected language".into());
                }
                Some(json)
            }
            Err(e) => {
                outcome.status = match &e {
                    Error::FileTooLarge { .. } | Error::UnsupportedFileType(_) => {
                        tracing::warn!("Rejected '{}': {}", file.name, e);
                        FileStatus::Rejected
                    }
                    Error::EmptyContent(_) => {
                        tracing::warn!("'{}' is empty, skipping", file.name);
                        FileStatus::Empty
                    }
                    _ => {
                        tracing::error!("Failed to process '{}': {}", file.name, e);
                        FileStatus::Failed
                    }
                };
                outcome.message = Some(e.to_string());
                None
            }
        };

        outcome.elapsed_ms = started.elapsed().as_millis() as u64;
        (outcome, json)
    }

    async fn pause(&self) {
        if self.yield_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.yield_interval).await;
        }
    }

    /// Run a batch
    ///
    /// No per-file error aborts the batch. The cancellation flag is checked
    /// before each file; finished files are kept when it is set.
    pub async fn run(
        &self,
        files: &[UploadedFile],
        reporter: &dyn ProgressReporter,
        cancel: &CancellationFlag,
    ) -> Result<BatchResult> {
        if files.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let total = files.len();
        let mut tracker = ProgressTracker::new(total);
        let mut result = BatchResult::new(total);

        tracing::info!("Starting batch of {} files", total);

        for (index, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!("Batch cancelled after {} of {} files", index, total);
                result.mark_cancelled();
                break;
            }

            let current = index + 1;
            reporter.file_started(&tracker.file_started(current, &file.name));

            let (outcome, json) = self.process_file(file).await;
            if let Some(json) = json {
                result.insert_document(file.name.clone(), json);
            }

            let update = tracker.file_finished(current, &file.name);
            reporter.file_finished(&update, &outcome);
            result.push_outcome(outcome);

            self.pause().await;
        }

        result.set_elapsed(tracker.elapsed());
        let summary = result.summary();
        reporter.batch_finished(&summary);

        Ok(result)
    }
}
