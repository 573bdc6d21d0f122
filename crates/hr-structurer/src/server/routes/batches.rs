//! Batch submission, progress and result endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{JobProgress, QueueStats};
use crate::server::state::AppState;

use super::upload::read_uploads;

/// Response from batch submission
#[derive(Debug, Serialize)]
pub struct SubmitBatchResponse {
    pub job_id: Uuid,
    pub files_queued: usize,
    pub message: String,
}

/// POST /api/batches - Upload files for background structuring
pub async fn submit_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitBatchResponse>> {
    let files = read_uploads(&mut multipart).await?;
    let files_queued = files.len();

    let job_id = state.job_queue().submit(files).await?;

    Ok(Json(SubmitBatchResponse {
        job_id,
        files_queued,
        message: format!(
            "Batch queued successfully. Use /api/batches/{} to check progress.",
            job_id
        ),
    }))
}

/// Jobs and queue statistics
#[derive(Debug, Serialize)]
pub struct ListBatchesResponse {
    pub jobs: Vec<JobProgress>,
    pub stats: QueueStats,
}

/// GET /api/batches - List all batches
pub async fn list_batches(State(state): State<AppState>) -> Json<ListBatchesResponse> {
    let queue = state.job_queue();
    Json(ListBatchesResponse {
        jobs: queue.list_jobs(),
        stats: queue.stats(),
    })
}

/// GET /api/batches/:id - Batch progress
pub async fn get_batch(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobProgress>> {
    state
        .job_queue()
        .get_progress(job_id)
        .map(Json)
        .ok_or(Error::JobNotFound(job_id))
}

/// POST /api/batches/:id/cancel - Stop a batch before its next file
pub async fn cancel_batch(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobProgress>> {
    state.job_queue().cancel(job_id).map(Json)
}

/// GET /api/batches/:id/documents - Structured records by original filename
pub async fn get_documents(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Map<String, Value>>> {
    let result = state.job_queue().result(job_id)?;

    let mut documents = Map::new();
    for (filename, json) in result.documents() {
        documents.insert(filename.to_string(), serde_json::from_str(json)?);
    }

    Ok(Json(documents))
}

/// GET /api/batches/:id/archive - ZIP download of all records
pub async fn download_archive(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let result = state.job_queue().result(job_id)?;
    if result.document_count() == 0 {
        return Err(Error::NoDocuments(job_id));
    }

    let output = state.archive().build(result.documents())?;
    if output.entries.is_empty() {
        return Err(Error::NoDocuments(job_id));
    }

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config().archive.file_name
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.bytes,
    ))
}
