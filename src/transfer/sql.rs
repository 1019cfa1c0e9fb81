//! The single execution primitive used by the transfer code, plus SQL text quoting.

use sqlx::{Executor, SqliteConnection};

/// Execute one SQL statement on `conn` and return the number of rows it changed.
/// Driver errors are returned untouched.
pub async fn run(conn: &mut SqliteConnection, sql: &str) -> Result<u64, sqlx::Error> {
    let res = Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await?;
    Ok(res.rows_affected())
}

/// Quote an identifier (schema, table, column, alias) for interpolation into SQL text.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal, e.g. a file path for `ATTACH` or `VACUUM INTO`.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
