use crate::db::schema::apply_schema;
use crate::error::LoopError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

/// Open (creating if needed) the live database and make sure the application tables exist.
///
/// The returned pool is the only handle the rest of the crate uses to reach the database file.
pub async fn connect(database_url: &str, busy_timeout: Duration) -> Result<SqlitePool, LoopError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(busy_timeout)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;

    apply_schema(&pool).await?;

    info!(database_url, "live database ready");
    Ok(pool)
}
