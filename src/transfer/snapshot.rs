use std::time::Instant;

use tempfile::TempPath;
use tracing::{info, warn};

use super::DatabaseTransfer;
use super::sql::{quote_literal, run};
use super::staging::{self, EXPORT_PREFIX};
use crate::error::LoopError;

impl DatabaseTransfer {
    /// Write a transactionally consistent copy of the live database to a new temporary
    /// file. The returned path deletes the file when dropped.
    ///
    /// `VACUUM INTO` cannot run inside a transaction; pooled connections are only ever
    /// handed out in autocommit mode, so none is opened here.
    pub async fn export_snapshot(&self) -> Result<TempPath, LoopError> {
        let target = staging::reserve_path(EXPORT_PREFIX)?;
        let target_sql = target
            .to_str()
            .map(quote_literal)
            .ok_or_else(|| LoopError::UnexpectedError("temp path is not valid UTF-8".into()))?;

        let started = Instant::now();
        let result: Result<u64, sqlx::Error> = async {
            let mut conn = self.pool.acquire().await?;
            self.apply_busy_timeout(&mut conn).await?;
            run(&mut conn, &format!("VACUUM INTO {target_sql}")).await
        }
        .await;

        if let Err(e) = result {
            warn!(error = %e, "snapshot failed");
            // `target` is dropped on return, removing any partial file.
            return Err(classify_snapshot_error(e));
        }

        let size = tokio::fs::metadata(&target).await?.len();
        info!(
            bytes = size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "database snapshot written"
        );
        Ok(target)
    }
}

/// Old SQLite builds reject `VACUUM INTO` as a syntax error near "INTO".
fn classify_snapshot_error(e: sqlx::Error) -> LoopError {
    let unsupported = e.as_database_error().is_some_and(|db| {
        let msg = db.message().to_ascii_lowercase();
        msg.contains("syntax error") && msg.contains("into")
    });
    if unsupported {
        LoopError::SnapshotUnsupported { source: e }
    } else {
        LoopError::DatabaseError(e)
    }
}
