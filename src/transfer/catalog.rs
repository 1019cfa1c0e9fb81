//! Read-only views of a schema's catalog (`main` or an attached alias).
//!
//! Every function collects its rows with `fetch_all`, so the catalog cursor is
//! closed before the caller executes any DDL on the same connection.

use sqlx::SqliteConnection;

use super::sql::quote_ident;

/// Schema name of the live database inside a connection.
pub const MAIN_SCHEMA: &str = "main";

// Names starting with `sqlite_` belong to the engine. `_` is a LIKE wildcard, so the
// prefix is matched with an explicit escape.
const NOT_RESERVED: &str = r"name NOT LIKE 'sqlite\_%' ESCAPE '\'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaObjectKind {
    Table,
    View,
    Index,
    Trigger,
}

impl SchemaObjectKind {
    /// Value of the `type` column in `sqlite_master`.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaObjectKind::Table => "table",
            SchemaObjectKind::View => "view",
            SchemaObjectKind::Index => "index",
            SchemaObjectKind::Trigger => "trigger",
        }
    }

    pub(crate) fn drop_keyword(self) -> &'static str {
        match self {
            SchemaObjectKind::Table => "TABLE",
            SchemaObjectKind::View => "VIEW",
            SchemaObjectKind::Index => "INDEX",
            SchemaObjectKind::Trigger => "TRIGGER",
        }
    }
}

/// User table names in `schema`, ascending.
pub async fn list_tables(
    conn: &mut SqliteConnection,
    schema: &str,
) -> Result<Vec<String>, sqlx::Error> {
    list_object_names(conn, schema, SchemaObjectKind::Table).await
}

/// Names of user objects of `kind` in `schema`, ascending.
///
/// Indexes without their own DDL (created implicitly by a UNIQUE or PRIMARY KEY
/// constraint) are left out; they go away with their table.
pub async fn list_object_names(
    conn: &mut SqliteConnection,
    schema: &str,
    kind: SchemaObjectKind,
) -> Result<Vec<String>, sqlx::Error> {
    let ddl_filter = if kind == SchemaObjectKind::Index {
        " AND sql IS NOT NULL"
    } else {
        ""
    };
    let q = format!(
        "SELECT name FROM {}.sqlite_master WHERE type = ? AND {NOT_RESERVED}{ddl_filter} ORDER BY name",
        quote_ident(schema)
    );
    sqlx::query_scalar::<_, String>(&q)
        .bind(kind.as_str())
        .persistent(false)
        .fetch_all(conn)
        .await
}

/// Column names of `schema.table` in declaration order.
pub async fn list_columns(
    conn: &mut SqliteConnection,
    schema: &str,
    table: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?, ?) ORDER BY cid")
        .bind(table)
        .bind(schema)
        .fetch_all(conn)
        .await
}

/// Creation statements of user objects of `kind` in `schema`, ascending by name.
/// Objects without recorded DDL, or with blank DDL, are skipped.
pub async fn list_object_ddl(
    conn: &mut SqliteConnection,
    schema: &str,
    kind: SchemaObjectKind,
) -> Result<Vec<String>, sqlx::Error> {
    let q = format!(
        "SELECT sql FROM {}.sqlite_master WHERE type = ? AND sql IS NOT NULL AND {NOT_RESERVED} ORDER BY name",
        quote_ident(schema)
    );
    let rows = sqlx::query_scalar::<_, Option<String>>(&q)
        .bind(kind.as_str())
        .persistent(false)
        .fetch_all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .flatten()
        .map(|ddl| ddl.trim().to_string())
        .filter(|ddl| !ddl.is_empty())
        .collect())
}

/// Integer header setting such as `user_version`; 0 when the pragma yields no value.
pub async fn read_int_pragma(
    conn: &mut SqliteConnection,
    schema: &str,
    pragma: &'static str,
) -> Result<i64, sqlx::Error> {
    let q = format!("PRAGMA {}.{pragma}", quote_ident(schema));
    let value = sqlx::query_scalar::<_, Option<i64>>(&q)
        .persistent(false)
        .fetch_optional(conn)
        .await?;
    Ok(value.flatten().unwrap_or(0))
}
