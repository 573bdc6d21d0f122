//! Uploaded files and the closed set of accepted media types

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// MIME type of Word documents (.docx)
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Accepted media types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Plain text (UTF-8)
    PlainText,
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
}

impl MediaType {
    /// Parse a declared MIME type, ignoring parameters and case
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Some(Self::PlainText),
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            _ => None,
        }
    }

    /// Guess the MIME type of a file from its extension
    pub fn guess_mime(filename: &str) -> Option<String> {
        mime_guess::from_path(filename)
            .first()
            .map(|mime| mime.essence_str().to_string())
    }

    /// Detect an accepted media type from a filename extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::guess_mime(filename).and_then(|mime| Self::from_mime(&mime))
    }

    /// Canonical MIME string
    pub fn mime(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Pdf => "application/pdf",
            Self::Docx => DOCX_MIME,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// A file handed to the pipeline by a caller
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename as supplied by the caller
    pub name: String,
    /// Declared size in bytes
    pub size: u64,
    /// Declared media type, verbatim
    pub media_type: String,
    /// File content
    pub data: Bytes,
}

impl UploadedFile {
    /// Create an upload whose declared size is the content length
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            media_type: media_type.into(),
            data,
        }
    }

    /// Create an upload with the media type guessed from the filename
    pub fn guessed(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let media_type = MediaType::guess_mime(&name)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self::new(name, media_type, data)
    }

    /// Override the declared size
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// The accepted media type, if the declared one is supported
    pub fn accepted_type(&self) -> Option<MediaType> {
        MediaType::from_mime(&self.media_type)
    }
}
