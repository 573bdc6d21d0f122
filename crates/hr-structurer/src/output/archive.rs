//! ZIP archive of per-document JSON records

use std::collections::HashSet;
use std::io::{Cursor, Write};

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};

/// Fallback entry name when sanitizing leaves nothing
const DEFAULT_ENTRY_NAME: &str = "document";

/// Strip a filename down to word characters, `-`, `_`, `.` and spaces,
/// turn spaces into underscores and cap the length
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        DEFAULT_ENTRY_NAME.to_string()
    } else {
        sanitized
    }
}

/// Archive bytes plus what went into it
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
    /// Source filenames whose JSON could not be parsed
    pub skipped: Vec<String>,
}

/// Writes one pretty-printed JSON entry per document
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    sanitize_names: bool,
    max_entry_name_len: usize,
}

impl ArchiveBuilder {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            sanitize_names: config.sanitize_names,
            max_entry_name_len: config.max_entry_name_len,
        }
    }

    fn base_name(&self, filename: &str) -> String {
        if self.sanitize_names {
            sanitize_filename(filename, self.max_entry_name_len)
        } else if filename.is_empty() {
            DEFAULT_ENTRY_NAME.to_string()
        } else {
            filename.to_string()
        }
    }

    /// Unique `<name>.json`, suffixing `_2`, `_3`, ... on collision
    fn entry_name(&self, filename: &str, used: &mut HashSet<String>) -> String {
        let base = self.base_name(filename);
        let mut candidate = format!("{}.json", base);
        let mut n = 2;
        while used.contains(&candidate) {
            candidate = format!("{}_{}.json", base, n);
            n += 1;
        }
        used.insert(candidate.clone());
        candidate
    }

    /// Build the archive from `(original filename, serialized JSON)` pairs
    ///
    /// Entries whose JSON does not parse are logged and skipped.
    pub fn build<'a, I>(&self, documents: I) -> Result<ArchiveOutput>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut used = HashSet::new();
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for (filename, json) in documents {
            let pretty = match serde_json::from_str::<serde_json::Value>(json)
                .and_then(|value| serde_json::to_string_pretty(&value))
            {
                Ok(pretty) => pretty,
                Err(e) => {
                    tracing::error!("Skipping '{}' in archive: invalid JSON: {}", filename, e);
                    skipped.push(filename.to_string());
                    continue;
                }
            };

            let name = self.entry_name(filename, &mut used);
            zip.start_file(name.as_str(), options)?;
            zip.write_all(pretty.as_bytes())?;
            tracing::debug!("Added archive entry {}", name);
            entries.push(name);
        }

        let bytes = zip
            .finish()
            .map_err(|e| Error::Archive(format!("Failed to finish archive: {}", e)))?
            .into_inner();

        tracing::info!(
            "Built archive with {} entries ({} skipped, {} bytes)",
            entries.len(),
            skipped.len(),
            bytes.len()
        );

        Ok(ArchiveOutput {
            bytes,
            entries,
            skipped,
        })
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new(&ArchiveConfig::default())
    }
}
