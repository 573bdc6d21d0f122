//! Batch results and per-file outcomes

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final status of one file in a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Structured record produced
    Processed,
    /// Refused before decoding (too large or unsupported type)
    Rejected,
    /// Decoded text was empty
    Empty,
    /// Decoding or structuring failed
    Failed,
    /// Structured, but replaced by a later file with the same name
    Superseded,
}

impl FileStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Short label for status maps
    pub fn label(&self) -> &'static str {
        match self {
            Self::Processed => "Processed",
            Self::Rejected => "Rejected",
            Self::Empty => "Empty",
            Self::Failed => "Failed",
            Self::Superseded => "Superseded",
        }
    }
}

/// Outcome of processing one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Original filename
    pub filename: String,
    /// Display title derived from the filename
    pub title: String,
    pub status: FileStatus,
    /// Error or warning text for unsuccessful files
    pub message: Option<String>,
    pub elapsed_ms: u64,
    /// Fields that fell back to defaults
    #[serde(default)]
    pub degraded_fields: Vec<String>,
    /// Detected language (ISO 639-3)
    pub language: Option<String>,
}

impl FileOutcome {
    /// Entry for the processed-documents display list
    pub fn display_line(&self) -> String {
        match self.status {
            FileStatus::Processed => self.title.clone(),
            FileStatus::Superseded => format!("{} - [Replaced]", self.title),
            _ => format!("{} - [Processing Failed]", self.title),
        }
    }
}

/// Counts reported at the end of a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files submitted
    pub total: usize,
    /// Files attempted (less than total only after cancellation)
    pub attempted: usize,
    pub succeeded: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} succeeded", self.succeeded, self.attempted)?;
        if self.cancelled {
            write!(f, " (cancelled, {} not attempted)", self.total - self.attempted)?;
        }
        Ok(())
    }
}

/// Aggregated result of one batch
///
/// `documents` maps original filename to the serialized record, in the order
/// files were processed; failed files have no entry and are only visible in
/// `outcomes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    documents: Vec<(String, String)>,
    outcomes: Vec<FileOutcome>,
    total_files: usize,
    cancelled: bool,
    elapsed_ms: u64,
}

impl BatchResult {
    /// Start an empty result for `total_files` inputs
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    /// Store a serialized document, replacing an earlier entry of the same name
    ///
    /// The outcome of a replaced document is marked `Superseded` so the
    /// summary only counts records that are still present.
    pub fn insert_document(&mut self, filename: impl Into<String>, json: String) {
        let filename = filename.into();
        match self.documents.iter_mut().find(|(name, _)| *name == filename) {
            Some(entry) => {
                tracing::warn!("Duplicate filename '{}'; keeping the later document", filename);
                entry.1 = json;
                if let Some(earlier) = self
                    .outcomes
                    .iter_mut()
                    .rev()
                    .find(|o| o.filename == filename && o.status.is_success())
                {
                    earlier.status = FileStatus::Superseded;
                    earlier.message = Some("Replaced by a later file with the same name".into());
                }
            }
            None => self.documents.push((filename, json)),
        }
    }

    pub fn push_outcome(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
    }

    /// Serialized record for a filename
    pub fn document(&self, filename: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, json)| json.as_str())
    }

    /// Successful documents in processing order
    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents
            .iter()
            .map(|(name, json)| (name.as_str(), json.as_str()))
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Per-file outcomes in input order
    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// Display list of processed documents
    pub fn display_list(&self) -> Vec<String> {
        self.outcomes.iter().map(FileOutcome::display_line).collect()
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Final counts
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.total_files,
            attempted: self.outcomes.len(),
            succeeded: self.outcomes.iter().filter(|o| o.status.is_success()).count(),
            cancelled: self.cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: FileStatus) -> FileOutcome {
        FileOutcome {
            filename: name.to_string(),
            title: name.to_string(),
            status,
            message: None,
            elapsed_ms: 5,
            degraded_fields: vec![],
            language: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut result = BatchResult::new(3);
        result.push_outcome(outcome("a", FileStatus::Processed));
        result.push_outcome(outcome("b", FileStatus::Empty));
        result.push_outcome(outcome("c", FileStatus::Processed));

        let summary = result.summary();
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.to_string(), "2 of 3 succeeded");
    }

    #[test]
    fn test_cancelled_summary_text() {
        let mut result = BatchResult::new(4);
        result.push_outcome(outcome("a", FileStatus::Processed));
        result.mark_cancelled();
        assert_eq!(
            result.summary().to_string(),
            "1 of 1 succeeded (cancelled, 3 not attempted)"
        );
    }

    #[test]
    fn test_duplicate_filename_replaces_entry() {
        let mut result = BatchResult::new(3);
        for (name, json) in [("a.txt", "{\"v\":1}"), ("b.txt", "{\"v\":2}"), ("a.txt", "{\"v\":3}")] {
            result.insert_document(name, json.to_string());
            result.push_outcome(outcome(name, FileStatus::Processed));
        }

        assert_eq!(result.document_count(), 2);
        assert_eq!(result.document("a.txt"), Some("{\"v\":3}"));
        let names: Vec<_> = result.documents().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let statuses: Vec<_> = result.outcomes().iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![FileStatus::Superseded, FileStatus::Processed, FileStatus::Processed]
        );
        assert_eq!(result.summary().to_string(), "2 of 3 succeeded");
    }

    #[test]
    fn test_display_list_marks_failures() {
        let mut result = BatchResult::new(2);
        result.push_outcome(outcome("Permisjon", FileStatus::Processed));
        result.push_outcome(outcome("Tom Fil", FileStatus::Empty));
        assert_eq!(
            result.display_list(),
            vec!["Permisjon".to_string(), "Tom Fil - [Processing Failed]".to_string()]
        );
    }
}
