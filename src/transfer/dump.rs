//! Build a standalone database file from a JSON dump:
//!
//! ```json
//! { "schema": { "objects": [{ "type": "table", "sql": "CREATE TABLE ..." }], "user_version": 3 },
//!   "data":   { "Habits": [{ "id": 1, "name": "Read" }] } }
//! ```

use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::{Connection, Sqlite, SqliteConnection};
use tempfile::TempPath;
use tracing::{debug, info};

use super::catalog::{self, MAIN_SCHEMA, SchemaObjectKind};
use super::sql::{quote_ident, run};
use super::staging::{self, EXPORT_PREFIX};
use crate::error::LoopError;

/// Create a new temporary database file from `dump`. The file deletes itself when the
/// returned path is dropped.
pub async fn build_from_dump(dump: &Value) -> Result<TempPath, LoopError> {
    let schema = required(dump, "schema")?;
    let objects = required(schema, "objects")?;
    let data = required(dump, "data")?;
    let user_version = schema
        .get("user_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let target = staging::reserve_path(EXPORT_PREFIX)?;
    let opts = SqliteConnectOptions::new()
        .filename(&target)
        .create_if_missing(true)
        .foreign_keys(false)
        .journal_mode(SqliteJournalMode::Memory)
        .synchronous(SqliteSynchronous::Off);
    let mut conn = SqliteConnection::connect_with(&opts).await?;

    run(&mut conn, "BEGIN").await?;
    exec_objects(&mut conn, objects, SchemaObjectKind::Table).await?;
    let rows = insert_rows(&mut conn, data).await?;
    exec_objects(&mut conn, objects, SchemaObjectKind::View).await?;
    exec_objects(&mut conn, objects, SchemaObjectKind::Index).await?;
    exec_objects(&mut conn, objects, SchemaObjectKind::Trigger).await?;
    run(&mut conn, &format!("PRAGMA user_version = {user_version}")).await?;
    run(&mut conn, "COMMIT").await?;
    conn.close().await?;

    info!(rows, user_version, "database built from JSON dump");
    Ok(target)
}

fn required<'a>(node: &'a Value, name: &str) -> Result<&'a Value, LoopError> {
    match node.get(name) {
        Some(v) if !v.is_null() => Ok(v),
        _ => Err(LoopError::BadRequest(format!("Missing field: {name}"))),
    }
}

async fn exec_objects(
    conn: &mut SqliteConnection,
    objects: &Value,
    kind: SchemaObjectKind,
) -> Result<(), LoopError> {
    let ddls = objects
        .as_array()
        .into_iter()
        .flatten()
        .filter(|obj| obj.get("type").and_then(Value::as_str) == Some(kind.as_str()))
        .filter_map(|obj| obj.get("sql").and_then(Value::as_str))
        .map(str::trim)
        .filter(|ddl| !ddl.is_empty());

    for ddl in ddls {
        run(conn, ddl).await?;
    }
    Ok(())
}

async fn insert_rows(conn: &mut SqliteConnection, data: &Value) -> Result<u64, LoopError> {
    let Some(tables) = data.as_object() else {
        return Err(LoopError::BadRequest(
            "Field data must be an object of table rows".to_string(),
        ));
    };

    let mut inserted = 0;
    for (table, rows) in tables {
        let Some(rows) = rows.as_array().filter(|rows| !rows.is_empty()) else {
            continue;
        };
        let columns = catalog::list_columns(conn, MAIN_SCHEMA, table).await?;
        if columns.is_empty() {
            return Err(LoopError::BadRequest(format!(
                "Data given for unknown table: {table}"
            )));
        }

        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(",");
        let placeholders = vec!["?"; columns.len()].join(",");
        let sql = format!(
            "INSERT INTO {} ({column_list}) VALUES ({placeholders})",
            quote_ident(table)
        );

        for row in rows {
            let mut query = sqlx::query(&sql);
            for column in &columns {
                query = bind_json(query, row.get(column));
            }
            query.execute(&mut *conn).await?;
        }
        debug!(table = %table, rows = rows.len(), "dump rows inserted");
        inserted += rows.len() as u64;
    }
    Ok(inserted)
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Bind a JSON value using the closest SQLite storage class. Booleans become 0/1;
/// arrays and objects are stored as their JSON text.
fn bind_json<'q>(query: SqliteQuery<'q>, value: Option<&Value>) -> SqliteQuery<'q> {
    match value {
        None | Some(Value::Null) => query.bind(None::<i64>),
        Some(Value::Bool(b)) => query.bind(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Some(Value::String(s)) => query.bind(s.clone()),
        Some(other) => query.bind(other.to_string()),
    }
}
