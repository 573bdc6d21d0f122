//! Synchronous single-document structuring

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::StructureReport;

use super::upload::read_uploads;

/// POST /api/structure - Structure one uploaded file and return the record
pub async fn structure_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StructureReport>> {
    let mut files = read_uploads(&mut multipart).await?;
    if files.len() > 1 {
        tracing::warn!("Received {} files, structuring only the first", files.len());
    }
    if files.is_empty() {
        return Err(Error::EmptyBatch);
    }
    let file = files.swap_remove(0);

    let report = state.pipeline().structure_file(&file).await?;
    tracing::info!(
        "Structured '{}' (category: {}, degraded: {:?})",
        file.name,
        report.document.category,
        report.degraded_fields()
    );

    Ok(Json(report))
}
