use crate::db::{self, Repetition};
use crate::error::LoopError;
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/repetitions",
        get(list_repetitions)
            .post(upsert_repetition)
            .delete(delete_repetition),
    )
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    /// Inclusive lower bound (seconds or millis).
    from: i64,
    /// Exclusive upper bound (seconds or millis).
    to: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepetitionUpsert {
    habit_id: Option<i64>,
    timestamp: Option<i64>,
    value: Option<i64>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepetitionKey {
    habit_id: i64,
    timestamp: i64,
}

async fn list_repetitions(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Repetition>>, LoopError> {
    let rows = db::repetitions::list_range(&state.pool, range.from, range.to).await?;
    Ok(Json(rows))
}

/// POST /api/repetitions
///
/// A missing or null `value` removes the repetition for that day.
async fn upsert_repetition(
    State(state): State<AppState>,
    Json(body): Json<RepetitionUpsert>,
) -> Result<Response, LoopError> {
    let (Some(habit_id), Some(timestamp)) = (body.habit_id, body.timestamp) else {
        return Ok((StatusCode::BAD_REQUEST, "Missing habitId or timestamp.").into_response());
    };

    db::repetitions::upsert(&state.pool, habit_id, timestamp, body.value, body.notes).await?;
    Ok((StatusCode::OK, "Saved").into_response())
}

async fn delete_repetition(
    State(state): State<AppState>,
    Query(key): Query<RepetitionKey>,
) -> Result<&'static str, LoopError> {
    db::repetitions::delete(&state.pool, key.habit_id, key.timestamp).await?;
    Ok("Deleted")
}
