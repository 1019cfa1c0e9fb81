mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::{exec, habit_rows, live_db, write_db};
use loop_server::config::{CorsConfig, TransferConfig};
use loop_server::server::router::{AppState, loop_router};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "loop-test-boundary";

fn app(pool: sqlx::SqlitePool) -> Router {
    let state = AppState::new(pool, &TransferConfig::default());
    loop_router(state, &CorsConfig::default())
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn multipart_request(field: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.db\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/import-db")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("failed to build request")
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn export_route_streams_attachment() {
    let live = live_db().await;
    exec(&live.pool, "INSERT INTO Habits (id, name) VALUES (1, 'Read')").await;
    let app = app(live.pool.clone());

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/export-db")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Loop_Export.db\""
    );
    let exposed = resp.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS]
        .to_str()
        .expect("header text")
        .to_ascii_lowercase();
    assert!(exposed.contains("content-disposition"), "{exposed}");

    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert!(bytes.starts_with(b"SQLite format 3\0"));
}

#[tokio::test]
async fn import_route_replaces_live_database() {
    let live = live_db().await;
    exec(&live.pool, "INSERT INTO Habits (id, name) VALUES (1, 'Read')").await;

    let source = live.file("upload.db");
    write_db(
        &source,
        &[
            "CREATE TABLE Habits (id INTEGER PRIMARY KEY, name TEXT)",
            "INSERT INTO Habits (id, name) VALUES (1, 'Exercise')",
        ],
    )
    .await;
    let content = std::fs::read(&source).expect("read upload");

    let resp = app(live.pool.clone())
        .oneshot(multipart_request("file", &content))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Import completed successfully.");
    assert_eq!(habit_rows(&live.pool).await, vec![(1, Some("Exercise".to_string()))]);
}

#[tokio::test]
async fn import_route_rejects_missing_or_bogus_upload() {
    let live = live_db().await;
    exec(&live.pool, "INSERT INTO Habits (id, name) VALUES (1, 'Read')").await;
    let app = app(live.pool.clone());

    // Wrong field name.
    let resp = app
        .clone()
        .oneshot(multipart_request("attachment", b"SQLite format 3\0"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "No file uploaded.");

    // Empty file.
    let resp = app
        .clone()
        .oneshot(multipart_request("file", b""))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "No file uploaded.");

    // Not a database.
    let resp = app
        .oneshot(multipart_request("file", b"hello, this is plain text"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(habit_rows(&live.pool).await, vec![(1, Some("Read".to_string()))]);
}

#[tokio::test]
async fn export_from_dump_route_builds_file() {
    let live = live_db().await;
    let dump = json!({
        "schema": {
            "objects": [
                { "type": "table", "sql": "CREATE TABLE Notes (id INTEGER PRIMARY KEY, body TEXT)" }
            ]
        },
        "data": { "Notes": [ { "id": 1, "body": "hi" } ] }
    });

    let resp = app(live.pool.clone())
        .oneshot(json_request("POST", "/api/export-db", &dump))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Loop_Export.db\""
    );

    let resp = app(live.pool.clone())
        .oneshot(json_request("POST", "/api/export-db", &json!({ "data": {} })))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Missing field: schema");
}

#[tokio::test]
async fn habit_routes_create_update_patch_and_reorder() {
    let live = live_db().await;
    let app = app(live.pool.clone());

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/habits",
            &json!({ "name": "Read", "position": 0, "type": 1, "unit": "pages" }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let read = body_json(resp).await;
    let read_id = read["id"].as_i64().expect("id");
    assert_eq!(read["name"], "Read");
    assert_eq!(read["type"], 1);
    assert_eq!(read["reminderDays"], 127);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/habits",
            &json!({ "name": "Walk", "position": 1 }),
        ))
        .await
        .expect("request failed");
    let walk_id = body_json(resp).await["id"].as_i64().expect("id");

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/habits/{read_id}"),
            &json!({ "description": "ten pages" }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "id": read_id, "description": "ten pages" })
    );

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/habits/reorder",
            &json!({ "order": [walk_id, read_id] }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/habits")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let list = body_json(resp).await;
    let names: Vec<&str> = list
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|h| h["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Walk", "Read"]);
    assert_eq!(list[1]["description"], "ten pages");

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/habits/9999",
            &json!({ "name": "Ghost" }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(json_request("PUT", "/api/habits/reorder", &json!("1,2")))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repetition_routes_normalize_timestamps() {
    let live = live_db().await;
    exec(&live.pool, "INSERT INTO Habits (id, name) VALUES (1, 'Read')").await;
    let app = app(live.pool.clone());

    // 2024-01-02T13:00:00Z in seconds; stored at that day's UTC midnight in millis.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/repetitions",
            &json!({ "habitId": 1, "timestamp": 1_704_200_400_i64, "value": 2 }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/repetitions?from=1704153600&to=1704240000")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!([{ "habit": 1, "timestamp": 1_704_153_600_000_i64, "value": 2, "notes": null }])
    );

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/repetitions",
            &json!({ "timestamp": 1_704_200_400_i64 }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "Missing habitId or timestamp.");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/repetitions?habitId=1&timestamp=1704200400000")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Deleted");

    let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Repetitions")
        .fetch_one(&live.pool)
        .await
        .expect("count");
    assert_eq!(left, 0);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let live = live_db().await;
    let resp = app(live.pool.clone())
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repetition_routes_reject_out_of_range_timestamps() {
    let live = live_db().await;
    exec(&live.pool, "INSERT INTO Habits (id, name) VALUES (1, 'Read')").await;
    let app = app(live.pool.clone());

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/repetitions?from=-9223372036854775807&to=0")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/repetitions",
            &json!({ "habitId": 1, "timestamp": i64::MIN, "value": 1 }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/repetitions?habitId=1&timestamp={}", i64::MIN))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
