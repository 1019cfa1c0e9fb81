use axum::{Json, extract::multipart::MultipartError, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::error;

/// Oldest SQLite release that understands `VACUUM INTO`.
pub const MIN_SNAPSHOT_SQLITE_VERSION: &str = "3.27.0";

#[derive(Debug, ThisError)]
pub enum LoopError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(
        "VACUUM INTO is not supported by the linked SQLite library; SQLite >= {MIN_SNAPSHOT_SQLITE_VERSION} is required: {source}"
    )]
    SnapshotUnsupported {
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Multipart error: {0}")]
    MultipartError(#[from] MultipartError),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<tokio::task::JoinError> for LoopError {
    fn from(e: tokio::task::JoinError) -> Self {
        LoopError::UnexpectedError(format!("background task failed: {e}"))
    }
}

impl IntoResponse for LoopError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            LoopError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "BAD_REQUEST".to_string(),
                    message,
                    details: None,
                },
            ),

            LoopError::JsonError(e) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "BAD_REQUEST".to_string(),
                    message: format!("Malformed JSON: {e}"),
                    details: None,
                },
            ),

            LoopError::MultipartError(e) => (
                e.status(),
                ApiErrorObject {
                    code: "BAD_UPLOAD".to_string(),
                    message: e.body_text(),
                    details: None,
                },
            ),

            LoopError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message,
                    details: None,
                },
            ),

            err @ LoopError::SnapshotUnsupported { .. } => {
                error!(error = %err, "snapshot primitive unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "ENGINE_UNSUPPORTED".to_string(),
                        message: err.to_string(),
                        details: Some(Value::String(format!(
                            "upgrade to SQLite >= {MIN_SNAPSHOT_SQLITE_VERSION}"
                        ))),
                    },
                )
            }

            err @ (LoopError::DatabaseError(_)
            | LoopError::IoError(_)
            | LoopError::UnexpectedError(_)) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                        details: None,
                    },
                )
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
