//! Error types for the HR document structurer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for structurer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structurer errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File exceeds the per-file size ceiling
    #[error("File '{filename}' is {size} bytes, exceeding the limit of {limit} bytes")]
    FileTooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    /// Media type is not one of the accepted types
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Text could not be decoded from the file
    #[error("Failed to decode '{filename}': {message}")]
    Decode { filename: String, message: String },

    /// Decoded text is empty or whitespace-only
    #[error("File '{0}' is empty or contains only whitespace")]
    EmptyContent(String),

    /// Inference service error (retryable)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Inference service refused the request (not retried)
    #[error("LLM rejected request: {0}")]
    LlmRejected(String),

    /// Document-level structuring failure
    #[error("Failed to structure '{filename}': {message}")]
    Structuring { filename: String, message: String },

    /// Archive creation error
    #[error("Archive error: {0}")]
    Archive(String),

    /// Malformed client request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Batch submitted without files
    #[error("No files provided")]
    EmptyBatch,

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Job has not reached a terminal state
    #[error("Job {0} is still running")]
    JobNotFinished(Uuid),

    /// Batch finished without any successful document
    #[error("No documents were produced by job {0}")]
    NoDocuments(Uuid),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// ZIP writer error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a decode error
    pub fn decode(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a structuring error
    pub fn structuring(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Structuring {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry of the failed inference call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Llm(_) | Self::Http(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "file_too_large"),
            Error::UnsupportedFileType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_type")
            }
            Error::Decode { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "decode_error"),
            Error::EmptyContent(_) => (StatusCode::UNPROCESSABLE_ENTITY, "empty_content"),
            Error::Llm(_) | Error::LlmRejected(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "llm_error")
            }
            Error::Structuring { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "structuring_error")
            }
            Error::Archive(_) | Error::Zip(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "archive_error")
            }
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::EmptyBatch => (StatusCode::BAD_REQUEST, "empty_batch"),
            Error::JobNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::JobNotFinished(_) => (StatusCode::CONFLICT, "job_running"),
            Error::NoDocuments(_) => (StatusCode::NOT_FOUND, "no_documents"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
