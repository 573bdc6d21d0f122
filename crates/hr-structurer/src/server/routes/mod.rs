//! API routes for the structuring server

pub mod batches;
pub mod structure;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_request_size: usize) -> Router<AppState> {
    Router::new()
        // Background batches with progress tracking
        .route(
            "/batches",
            post(batches::submit_batch).layer(DefaultBodyLimit::max(max_request_size)),
        )
        .route("/batches", get(batches::list_batches))
        .route("/batches/:id", get(batches::get_batch))
        .route("/batches/:id/cancel", post(batches::cancel_batch))
        .route("/batches/:id/documents", get(batches::get_documents))
        .route("/batches/:id/archive", get(batches::download_archive))
        // Single document, answered inline
        .route(
            "/structure",
            post(structure::structure_document).layer(DefaultBodyLimit::max(max_request_size)),
        )
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(serde_json::json!({
        "name": "hr-structurer",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Structures Norwegian HR documents into JSON records",
        "llm": {
            "provider": state.llm().name(),
            "model": state.llm().model(),
        },
        "limits": {
            "max_file_size": state.pipeline().max_file_size(),
            "max_request_size": config.server.max_request_size,
        },
        "cache": state.cache_stats(),
        "endpoints": {
            "POST /api/batches": "Upload files for background structuring",
            "GET /api/batches": "List all batches and queue stats",
            "GET /api/batches/:id": "Get batch progress",
            "POST /api/batches/:id/cancel": "Cancel a batch before its next file",
            "GET /api/batches/:id/documents": "Structured records by filename",
            "GET /api/batches/:id/archive": "Download all records as a ZIP archive",
            "POST /api/structure": "Structure a single document (sync)"
        }
    }))
}
