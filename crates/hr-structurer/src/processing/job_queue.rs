//! Job queue for background batch processing
//!
//! Jobs live in memory for the lifetime of the process; nothing is persisted.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{BatchResult, BatchSummary, FileOutcome, UploadedFile};

use super::progress::{CancellationFlag, ProgressReporter, ProgressUpdate};

/// Job status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Complete,
    Cancelled,
    Failed,
}

impl JobStatus {
    /// Whether the job will not change any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Failed)
    }
}

/// Progress information for a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Human-readable status line
    pub status_line: String,
    pub total_files: usize,
    pub files_attempted: usize,
    pub files_succeeded: usize,
    pub current_file: Option<String>,
    pub percent_complete: f64,
    pub elapsed_secs: f64,
    pub eta_secs: Option<f64>,
    pub eta_display: Option<String>,
    /// Filename to status label
    pub file_status: BTreeMap<String, String>,
    /// Per-file outcomes in input order
    pub files: Vec<FileOutcome>,
    /// Processed-documents display list
    pub display_list: Vec<String>,
    pub summary: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobProgress {
    pub fn new(job_id: Uuid, total_files: usize) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            status: JobStatus::Pending,
            status_line: "Queued".to_string(),
            total_files,
            files_attempted: 0,
            files_succeeded: 0,
            current_file: None,
            percent_complete: 0.0,
            elapsed_secs: 0.0,
            eta_secs: None,
            eta_display: None,
            file_status: BTreeMap::new(),
            files: Vec::new(),
            display_list: Vec::new(),
            summary: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn apply(&mut self, update: &ProgressUpdate) {
        self.status_line = update.status.clone();
        self.current_file = Some(update.filename.clone());
        self.files_attempted = update.attempted;
        self.percent_complete = update.percent();
        self.elapsed_secs = update.elapsed.as_secs_f64();
        self.eta_secs = update.eta.map(|eta| eta.as_secs_f64());
        self.eta_display = update.eta_display();
        self.updated_at = Utc::now();
    }
}

/// A submitted batch
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub files: Vec<UploadedFile>,
    pub cancel: CancellationFlag,
}

/// Job queue with in-memory progress and results
pub struct JobQueue {
    /// Active jobs with progress
    jobs: DashMap<Uuid, JobProgress>,
    cancel_flags: DashMap<Uuid, CancellationFlag>,
    results: DashMap<Uuid, Arc<BatchResult>>,
    /// Channel for sending jobs to the worker
    sender: mpsc::Sender<Job>,
    /// Jobs not yet finished
    queue_size: AtomicUsize,
}

impl JobQueue {
    /// Create a new job queue
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        let queue = Self {
            jobs: DashMap::new(),
            cancel_flags: DashMap::new(),
            results: DashMap::new(),
            sender,
            queue_size: AtomicUsize::new(0),
        };

        (queue, receiver)
    }

    /// Submit a batch for processing
    pub async fn submit(&self, files: Vec<UploadedFile>) -> Result<Uuid> {
        if files.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let job = Job {
            id: Uuid::new_v4(),
            files,
            cancel: CancellationFlag::new(),
        };
        let job_id = job.id;

        self.jobs.insert(job_id, JobProgress::new(job_id, job.files.len()));
        self.cancel_flags.insert(job_id, job.cancel.clone());
        self.queue_size.fetch_add(1, Ordering::SeqCst);

        tracing::info!("Submitted job {} with {} files", job_id, job.files.len());

        if let Err(e) = self.sender.send(job).await {
            tracing::error!("Failed to submit job: {}", e);
            self.fail(job_id, e.to_string());
            return Err(Error::internal("Job worker is not running"));
        }

        Ok(job_id)
    }

    /// Get job progress
    pub fn get_progress(&self, job_id: Uuid) -> Option<JobProgress> {
        self.jobs.get(&job_id).map(|p| p.clone())
    }

    /// Get all jobs, oldest first
    pub fn list_jobs(&self) -> Vec<JobProgress> {
        let mut jobs: Vec<_> = self.jobs.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Request cancellation; the batch stops before its next file
    pub fn cancel(&self, job_id: Uuid) -> Result<JobProgress> {
        let mut progress = self
            .jobs
            .get_mut(&job_id)
            .ok_or(Error::JobNotFound(job_id))?;

        if !progress.status.is_terminal() {
            if let Some(flag) = self.cancel_flags.get(&job_id) {
                flag.cancel();
            }
            progress.status_line = "Cancellation requested".to_string();
            progress.updated_at = Utc::now();
            tracing::info!("Cancellation requested for job {}", job_id);
        }

        Ok(progress.clone())
    }

    /// Finished batch result
    pub fn result(&self, job_id: Uuid) -> Result<Arc<BatchResult>> {
        let status = self
            .jobs
            .get(&job_id)
            .map(|p| p.status)
            .ok_or(Error::JobNotFound(job_id))?;

        if !status.is_terminal() {
            return Err(Error::JobNotFinished(job_id));
        }

        self.results
            .get(&job_id)
            .map(|r| Arc::clone(r.value()))
            .ok_or(Error::NoDocuments(job_id))
    }

    /// Mark a job as started
    pub fn mark_processing(&self, job_id: Uuid) {
        if let Some(mut progress) = self.jobs.get_mut(&job_id) {
            progress.status = JobStatus::Processing;
            progress.status_line = "Processing".to_string();
            progress.updated_at = Utc::now();
        }
    }

    /// Apply a progress snapshot
    pub fn update_progress(&self, job_id: Uuid, update: &ProgressUpdate) {
        if let Some(mut progress) = self.jobs.get_mut(&job_id) {
            progress.apply(update);
        }
    }

    /// Record a finished file
    pub fn record_outcome(&self, job_id: Uuid, update: &ProgressUpdate, outcome: &FileOutcome) {
        if let Some(mut progress) = self.jobs.get_mut(&job_id) {
            progress.apply(update);
            if outcome.status.is_success() {
                progress.files_succeeded += 1;
            }
            progress
                .file_status
                .insert(outcome.filename.clone(), outcome.status.label().to_string());
            progress.display_list.push(outcome.display_line());
            progress.files.push(outcome.clone());
        }
    }

    /// Store the result of a finished batch
    pub fn finish(&self, job_id: Uuid, result: BatchResult) {
        let summary = result.summary();
        if let Some(mut progress) = self.jobs.get_mut(&job_id) {
            progress.status = if summary.cancelled {
                JobStatus::Cancelled
            } else {
                JobStatus::Complete
            };
            progress.status_line = summary.to_string();
            progress.summary = Some(summary.to_string());
            // Outcomes can change after being reported (duplicate filenames)
            progress.files_succeeded = summary.succeeded;
            progress.files = result.outcomes().to_vec();
            progress.display_list = result.display_list();
            progress.current_file = None;
            progress.eta_secs = None;
            progress.eta_display = None;
            progress.elapsed_secs = result.elapsed().as_secs_f64();
            let now = Utc::now();
            progress.updated_at = now;
            progress.completed_at = Some(now);
        }
        self.results.insert(job_id, Arc::new(result));
        self.cancel_flags.remove(&job_id);
        self.queue_size.fetch_sub(1, Ordering::SeqCst);
    }

    /// Mark a job as failed
    pub fn fail(&self, job_id: Uuid, error: String) {
        if let Some(mut progress) = self.jobs.get_mut(&job_id) {
            progress.status = JobStatus::Failed;
            progress.status_line = "Failed".to_string();
            progress.error = Some(error);
            let now = Utc::now();
            progress.updated_at = now;
            progress.completed_at = Some(now);
        }
        self.cancel_flags.remove(&job_id);
        self.queue_size.fetch_sub(1, Ordering::SeqCst);
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        let count = |status: JobStatus| self.jobs.iter().filter(|j| j.status == status).count();

        QueueStats {
            total_jobs: self.jobs.len(),
            queued: self.queue_size.load(Ordering::SeqCst),
            pending: count(JobStatus::Pending),
            processing: count(JobStatus::Processing),
            complete: count(JobStatus::Complete),
            cancelled: count(JobStatus::Cancelled),
            failed: count(JobStatus::Failed),
        }
    }
}

/// Reporter that mirrors batch progress into the job registry
pub struct JobReporter {
    queue: Arc<JobQueue>,
    job_id: Uuid,
}

impl JobReporter {
    pub fn new(queue: Arc<JobQueue>, job_id: Uuid) -> Self {
        Self { queue, job_id }
    }
}

impl ProgressReporter for JobReporter {
    fn file_started(&self, update: &ProgressUpdate) {
        tracing::info!(job_id = %self.job_id, "{}", update.status);
        self.queue.update_progress(self.job_id, update);
    }

    fn file_finished(&self, update: &ProgressUpdate, outcome: &FileOutcome) {
        self.queue.record_outcome(self.job_id, update, outcome);
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        tracing::info!(job_id = %self.job_id, "Batch finished: {}", summary);
    }
}

/// Queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub total_jobs: usize,
    /// Jobs submitted but not finished
    pub queued: usize,
    pub pending: usize,
    pub processing: usize,
    pub complete: usize,
    pub cancelled: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::progress::ProgressTracker;
    use crate::types::FileStatus;

    fn files(n: usize) -> Vec<UploadedFile> {
        (0..n)
            .map(|i| UploadedFile::new(format!("f{}.txt", i), "text/plain", b"tekst".to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_submit_registers_pending_job() {
        let (queue, mut receiver) = JobQueue::new(8);
        let job_id = queue.submit(files(2)).await.unwrap();

        let progress = queue.get_progress(job_id).unwrap();
        assert_eq!(progress.status, JobStatus::Pending);
        assert_eq!(progress.total_files, 2);

        let job = receiver.recv().await.unwrap();
        assert_eq!(job.id, job_id);
        assert_eq!(queue.stats().queued, 1);
    }

    #[tokio::test]
    async fn test_empty_submission_rejected() {
        let (queue, _receiver) = JobQueue::new(8);
        assert!(matches!(queue.submit(vec![]).await, Err(Error::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_result_states() {
        let (queue, _receiver) = JobQueue::new(8);
        assert!(matches!(
            queue.result(Uuid::new_v4()),
            Err(Error::JobNotFound(_))
        ));

        let job_id = queue.submit(files(1)).await.unwrap();
        assert!(matches!(queue.result(job_id), Err(Error::JobNotFinished(_))));

        queue.finish(job_id, BatchResult::new(1));
        assert!(queue.result(job_id).is_ok());
        assert_eq!(queue.get_progress(job_id).unwrap().status, JobStatus::Complete);
        assert_eq!(queue.stats().queued, 0);
    }

    #[tokio::test]
    async fn test_cancel_sets_flag() {
        let (queue, mut receiver) = JobQueue::new(8);
        let job_id = queue.submit(files(3)).await.unwrap();
        let job = receiver.recv().await.unwrap();

        queue.cancel(job_id).unwrap();
        assert!(job.cancel.is_cancelled());

        let mut result = BatchResult::new(3);
        result.mark_cancelled();
        queue.finish(job_id, result);
        assert_eq!(queue.get_progress(job_id).unwrap().status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_reporter_updates_progress() {
        let (queue, _receiver) = JobQueue::new(8);
        let queue = Arc::new(queue);
        let job_id = queue.submit(files(2)).await.unwrap();
        let reporter = JobReporter::new(Arc::clone(&queue), job_id);

        let mut tracker = ProgressTracker::new(2);
        reporter.file_started(&tracker.file_started(1, "f0.txt"));
        let update = tracker.file_finished(1, "f0.txt");
        let outcome = FileOutcome {
            filename: "f0.txt".into(),
            title: "F0".into(),
            status: FileStatus::Processed,
            message: None,
            elapsed_ms: 3,
            degraded_fields: vec![],
            language: Some("nob".into()),
        };
        reporter.file_finished(&update, &outcome);

        let progress = queue.get_progress(job_id).unwrap();
        assert_eq!(progress.files_attempted, 1);
        assert_eq!(progress.files_succeeded, 1);
        assert_eq!(progress.percent_complete, 50.0);
        assert_eq!(progress.file_status["f0.txt"], "Processed");
        assert_eq!(progress.display_list, vec!["F0"]);
    }

    #[tokio::test]
    async fn test_finish_resyncs_replaced_outcomes() {
        let (queue, _receiver) = JobQueue::new(8);
        let queue = Arc::new(queue);
        let job_id = queue.submit(files(2)).await.unwrap();
        let reporter = JobReporter::new(Arc::clone(&queue), job_id);

        let mut tracker = ProgressTracker::new(2);
        let mut result = BatchResult::new(2);
        for (n, json) in ["{\"a\":1}", "{\"a\":2}"].into_iter().enumerate() {
            let outcome = FileOutcome {
                filename: "policy.txt".into(),
                title: "Policy".into(),
                status: FileStatus::Processed,
                message: None,
                elapsed_ms: 1,
                degraded_fields: vec![],
                language: None,
            };
            result.insert_document("policy.txt", json.to_string());
            result.push_outcome(outcome.clone());
            reporter.file_finished(&tracker.file_finished(n + 1, "policy.txt"), &outcome);
        }
        assert_eq!(queue.get_progress(job_id).unwrap().files_succeeded, 2);

        queue.finish(job_id, result);
        let progress = queue.get_progress(job_id).unwrap();
        assert_eq!(progress.files_succeeded, 1);
        assert_eq!(progress.summary.as_deref(), Some("1 of 2 succeeded"));
        assert_eq!(progress.files[0].status, FileStatus::Superseded);
        assert_eq!(progress.display_list, vec!["Policy - [Replaced]", "Policy"]);
    }
}
