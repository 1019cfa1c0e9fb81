//! Whole-database download/upload endpoints.

use crate::error::LoopError;
use crate::server::router::AppState;
use crate::transfer::dump::build_from_dump;
use crate::transfer::staging::{self, UPLOAD_PREFIX};
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tempfile::TempPath;
use tracing::{debug, info};

/// Multipart field carrying the uploaded database.
const UPLOAD_FIELD: &str = "file";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/export-db", get(export_db).post(export_db_from_dump))
        .route("/api/import-db", post(import_db))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// GET /api/export-db
///
/// Snapshot the live database and stream it as an attachment. The snapshot file is
/// removed once the body is fully sent or the client goes away.
async fn export_db(State(state): State<AppState>) -> Result<Response, LoopError> {
    let transfer = state.transfer.clone();
    let snapshot = tokio::spawn(async move { transfer.export_snapshot().await }).await??;
    attachment(snapshot, &state.export_filename).await
}

/// POST /api/export-db (JSON body)
///
/// Build a database file from a `{schema, data}` dump and stream it back.
async fn export_db_from_dump(
    State(state): State<AppState>,
    Json(dump): Json<Value>,
) -> Result<Response, LoopError> {
    let built = tokio::spawn(async move { build_from_dump(&dump).await }).await??;
    attachment(built, &state.export_filename).await
}

/// POST /api/import-db (multipart, field `file`)
///
/// Replace the live database with the uploaded one. The upload is written to a
/// temporary file before any database work starts, and the import runs on its own
/// task so a client disconnect cannot interrupt it.
async fn import_db(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, LoopError> {
    let mut staged = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            staged = Some(staging::stage_stream(UPLOAD_PREFIX, field).await?);
            break;
        }
        debug!(field = ?field.name(), "ignoring multipart field");
    }

    let Some(staged) = staged.filter(|s| s.len > 0) else {
        return Ok((StatusCode::BAD_REQUEST, "No file uploaded.").into_response());
    };
    info!(bytes = staged.len, "database upload received");

    let transfer = state.transfer.clone();
    match tokio::spawn(async move { transfer.import_staged(staged).await }).await? {
        Ok(_) => Ok((StatusCode::OK, "Import completed successfully.").into_response()),
        Err(LoopError::BadRequest(message)) => {
            Ok((StatusCode::BAD_REQUEST, message).into_response())
        }
        Err(e) => Err(e),
    }
}

async fn attachment(file: TempPath, filename: &str) -> Result<Response, LoopError> {
    let stream = staging::delete_on_close_stream(file).await?;
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| LoopError::UnexpectedError(format!("failed to build response: {e}")))
}
