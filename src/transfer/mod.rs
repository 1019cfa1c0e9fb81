//! Whole-database export and import for the live SQLite file.
//!
//! - `snapshot.rs`: `VACUUM INTO` a temporary file and stream it back
//! - `replace.rs`: replace `main` with the contents of an uploaded file
//! - `dump.rs`: build a database file from a JSON schema/data dump
//! - `catalog.rs`, `pipeline.rs`, `attach.rs`, `sql.rs`: the pieces they share
//! - `staging.rs`: temporary files owned by a single request

pub mod attach;
pub mod catalog;
pub mod dump;
pub mod pipeline;
mod replace;
mod snapshot;
pub mod sql;
pub mod staging;

pub use attach::AttachedSource;
pub use catalog::SchemaObjectKind;
pub use pipeline::{ImportSummary, Phase, REPLACE_PIPELINE};
pub use staging::StagedFile;

use sqlx::{SqliteConnection, SqlitePool};
use std::time::Duration;

/// Export/import entry point. Holds the live database's pool; every call acquires
/// its own connection from it.
#[derive(Clone)]
pub struct DatabaseTransfer {
    pool: SqlitePool,
    busy_timeout: Duration,
}

impl DatabaseTransfer {
    pub fn new(pool: SqlitePool, busy_timeout: Duration) -> Self {
        Self { pool, busy_timeout }
    }

    async fn apply_busy_timeout(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        let millis = self.busy_timeout.as_millis();
        sql::run(conn, &format!("PRAGMA busy_timeout = {millis}")).await?;
        Ok(())
    }
}
