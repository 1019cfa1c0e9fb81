use std::path::Path;
use std::time::Instant;

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use super::DatabaseTransfer;
use super::attach::AttachedSource;
use super::pipeline::{ImportSummary, REPLACE_PIPELINE};
use super::sql::run;
use super::staging::{self, StagedFile, UPLOAD_PREFIX};
use crate::error::LoopError;

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

impl DatabaseTransfer {
    /// Replace the live database's schema and data with the file at `uploaded`.
    /// The file is first copied to a private temporary path; the original is left alone.
    pub async fn import_from(&self, uploaded: &Path) -> Result<ImportSummary, LoopError> {
        let staged = staging::stage_copy(UPLOAD_PREFIX, uploaded).await?;
        self.import_staged(staged).await
    }

    /// Replace the live database from a staged file, which is deleted once this returns.
    ///
    /// Either everything is replaced and committed, or the live database is left as it
    /// was: all drops, creates and copies happen inside one transaction.
    pub async fn import_staged(&self, staged: StagedFile) -> Result<ImportSummary, LoopError> {
        if staged.len == 0 {
            return Err(LoopError::BadRequest("No file uploaded.".to_string()));
        }
        if !has_sqlite_header(&staged.path).await? {
            return Err(LoopError::BadRequest(
                "Uploaded file is not a SQLite database.".to_string(),
            ));
        }

        let started = Instant::now();
        let mut conn = self.pool.acquire().await?;
        self.apply_busy_timeout(&mut conn).await?;
        // Structural replacement breaks references transiently.
        run(&mut conn, "PRAGMA foreign_keys = OFF").await?;

        let outcome = replace_main(&mut conn, &staged.path).await;

        if let Err(e) = run(&mut conn, "PRAGMA foreign_keys = ON").await {
            warn!(error = %e, "failed to re-enable foreign keys; discarding connection");
            conn.close_on_drop();
        }

        match &outcome {
            Ok(summary) => info!(
                bytes = staged.len,
                tables = summary.tables,
                rows = summary.rows,
                views = summary.views,
                indexes = summary.indexes,
                triggers = summary.triggers,
                user_version = summary.user_version,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "database import committed"
            ),
            Err(e) => warn!(error = %e, "database import rolled back"),
        }
        outcome
    }
}

async fn replace_main(
    conn: &mut PoolConnection<Sqlite>,
    source: &Path,
) -> Result<ImportSummary, LoopError> {
    let mut attached = AttachedSource::attach(conn, source).await?;
    let alias = attached.alias().to_string();

    // IMMEDIATE takes the write lock up front, so contention waits on busy_timeout
    // instead of failing on a read-to-write upgrade. No transaction is open if it fails.
    if let Err(e) = run(attached.conn(), "BEGIN IMMEDIATE").await {
        attached.try_detach().await;
        return Err(e.into());
    }

    match apply_and_commit(attached.conn(), &alias).await {
        Ok(summary) => {
            // Detaching inside the finished transaction's state can report "database is
            // locked", so it happens afterwards in autocommit mode.
            if let Err(e) = attached.detach().await {
                warn!(alias = %alias, error = %e, "detach after commit failed; discarding connection");
            }
            Ok(summary)
        }
        Err(e) => {
            attached.try_detach().await;
            if let Err(rollback_err) = run(attached.conn(), "ROLLBACK").await {
                warn!(alias = %alias, error = %rollback_err, "rollback failed; discarding connection");
                attached.discard_connection();
            }
            attached.try_detach().await;
            Err(e.into())
        }
    }
}

/// Runs inside the transaction opened by `replace_main`.
async fn apply_and_commit(
    conn: &mut SqliteConnection,
    source: &str,
) -> Result<ImportSummary, sqlx::Error> {
    let mut summary = ImportSummary::default();
    for phase in REPLACE_PIPELINE {
        debug!(?phase, "import phase");
        phase.apply(conn, source, &mut summary).await?;
    }

    run(conn, "COMMIT").await?;
    Ok(summary)
}

async fn has_sqlite_header(path: &Path) -> Result<bool, LoopError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut header = [0u8; 16];
    match file.read_exact(&mut header).await {
        Ok(_) => Ok(&header == SQLITE_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}
