//! hr-structurer: batch structuring of Norwegian HR documents
//!
//! Uploaded text, PDF and DOCX files are decoded, checked for language,
//! stripped of a leading source URL and sent through five LLM extractions
//! (keywords, category, entities, sentiment and summary). Each document
//! becomes one JSON record; a batch of records is packaged as a ZIP archive.
//!
//! The pipeline is exposed as a library, an HTTP server with background
//! batches and progress tracking, and an optional command line tool.

pub mod config;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod ingestion;
pub mod logging;
pub mod output;
pub mod processing;
pub mod providers;
pub mod server;
pub mod types;

pub use config::StructurerConfig;
pub use error::{Error, Result};
pub use processing::{BatchPipeline, CancellationFlag, DocumentStructurer, ProgressReporter};
pub use providers::{build_provider, LlmProvider};
pub use types::{
    batch::{BatchResult, BatchSummary, FileOutcome, FileStatus},
    document::{MediaType, UploadedFile},
    record::{Entities, HrCategory, StructureReport, StructuredDocument},
};
