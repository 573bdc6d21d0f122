//! Background worker for processing jobs

use std::sync::Arc;
use tokio::sync::mpsc;

use super::batch::BatchPipeline;
use super::job_queue::{Job, JobQueue, JobReporter};

/// Worker that runs queued batches one at a time
pub struct ProcessingWorker {
    pipeline: Arc<BatchPipeline>,
    job_queue: Arc<JobQueue>,
}

impl ProcessingWorker {
    /// Create a new processing worker
    pub fn new(pipeline: Arc<BatchPipeline>, job_queue: Arc<JobQueue>) -> Self {
        Self {
            pipeline,
            job_queue,
        }
    }

    /// Start processing jobs from the queue
    pub async fn run(self, mut receiver: mpsc::Receiver<Job>) {
        tracing::info!("Processing worker started");

        while let Some(job) = receiver.recv().await {
            self.process_job(job).await;
        }

        tracing::info!("Processing worker stopped");
    }

    /// Run one job inside its own task so a panic fails only that job
    async fn process_job(&self, job: Job) {
        let job_id = job.id;
        tracing::info!("Processing job {} with {} files", job_id, job.files.len());
        self.job_queue.mark_processing(job_id);

        let pipeline = Arc::clone(&self.pipeline);
        let reporter = JobReporter::new(Arc::clone(&self.job_queue), job_id);
        let handle = tokio::spawn(async move {
            pipeline.run(&job.files, &reporter, &job.cancel).await
        });

        match handle.await {
            Ok(Ok(result)) => {
                tracing::info!("Job {} finished: {}", job_id, result.summary());
                self.job_queue.finish(job_id, result);
            }
            Ok(Err(e)) => {
                tracing::error!("Job {} failed: {}", job_id, e);
                self.job_queue.fail(job_id, e.to_string());
            }
            Err(e) => {
                tracing::error!("Job {} aborted: {}", job_id, e);
                self.job_queue
                    .fail(job_id, format!("Batch processing aborted: {}", e));
            }
        }
    }
}
