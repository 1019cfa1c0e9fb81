use crate::db::{self, Habit, HabitFields};
use crate::error::LoopError;
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/habits", get(list_habits).post(create_habit))
        .route("/api/habits/reorder", put(reorder_habits))
        .route(
            "/api/habits/{id}",
            get(get_habit).put(update_habit).patch(patch_habit),
        )
}

async fn create_habit(
    State(state): State<AppState>,
    Json(fields): Json<HabitFields>,
) -> Result<Json<Habit>, LoopError> {
    Ok(Json(db::habits::create(&state.pool, fields).await?))
}

async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(fields): Json<HabitFields>,
) -> Result<Json<Habit>, LoopError> {
    Ok(Json(db::habits::update(&state.pool, id, fields).await?))
}

async fn get_habit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Habit>, LoopError> {
    db::habits::get(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| LoopError::NotFound(format!("Habit not found with id {id}")))
}

async fn list_habits(State(state): State<AppState>) -> Result<Json<Vec<Habit>>, LoopError> {
    Ok(Json(db::habits::list(&state.pool).await?))
}

/// PATCH /api/habits/{id}
///
/// Only `description` is patchable; the response echoes what was applied.
async fn patch_habit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, LoopError> {
    let description = match body.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    if let Some(description) = description.as_deref() {
        db::habits::patch_description(&state.pool, id, description).await?;
    }
    Ok(Json(json!({ "id": id, "description": description })))
}

/// PUT /api/habits/reorder
///
/// Accepts `[ids...]` or `{"order": [ids...]}`; non-numeric entries are ignored.
async fn reorder_habits(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, LoopError> {
    let Some(ids) = parse_order(&body) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            "Expected JSON array or {\"order\":[...]}",
        )
            .into_response());
    };
    if ids.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "Order list is empty.").into_response());
    }

    db::habits::reorder(&state.pool, &ids).await?;
    Ok((StatusCode::OK, "Reordered.").into_response())
}

fn parse_order(body: &Value) -> Option<Vec<i64>> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(map) => map.get("order")?.as_array()?,
        _ => return None,
    };
    Some(list.iter().filter_map(Value::as_i64).collect())
}
