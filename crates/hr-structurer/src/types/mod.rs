//! Core types for uploads, structured records and batch results

pub mod batch;
pub mod document;
pub mod record;

pub use batch::{BatchResult, BatchSummary, FileOutcome, FileStatus};
pub use document::{MediaType, UploadedFile, DOCX_MIME};
pub use record::{
    DegradedField, Entities, FieldOutcome, HrCategory, SentimentKeywords, StructureReport,
    StructuredDocument,
};
