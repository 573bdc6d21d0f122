//! Document structuring, batch processing and the background job queue

mod batch;
mod job_queue;
mod progress;
mod structurer;
mod worker;

pub use batch::BatchPipeline;
pub use job_queue::{Job, JobProgress, JobQueue, JobReporter, JobStatus, QueueStats};
pub use progress::{
    compute_eta, format_eta, CancellationFlag, NoopReporter, ProgressReporter,
    ProgressTracker, ProgressUpdate,
};
pub use structurer::{derive_title, extract_url, DocumentStructurer};
pub use worker::ProcessingWorker;
