//! Multipart upload extraction

use axum::extract::Multipart;

use crate::error::{Error, Result};
use crate::types::{MediaType, UploadedFile};

/// Content type sent by clients that do not know better
const OCTET_STREAM: &str = "application/octet-stream";

/// Read every file field of a multipart request
///
/// Fields without a filename are ignored. A missing or generic content type
/// is replaced by one guessed from the filename.
pub async fn read_uploads(multipart: &mut Multipart) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            tracing::debug!("Ignoring non-file field {:?}", field.name());
            continue;
        };

        let media_type = match field.content_type() {
            Some(declared) if !declared.eq_ignore_ascii_case(OCTET_STREAM) => declared.to_string(),
            _ => MediaType::guess_mime(&filename).unwrap_or_else(|| OCTET_STREAM.to_string()),
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read file {}: {}", filename, e)))?;

        tracing::info!("Received file: {} ({} bytes, {})", filename, data.len(), media_type);
        files.push(UploadedFile::new(filename, media_type, data));
    }

    Ok(files)
}
