//! Batch output packaging

mod archive;

pub use archive::{sanitize_filename, ArchiveBuilder, ArchiveOutput};
