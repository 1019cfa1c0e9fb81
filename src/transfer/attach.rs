use std::path::Path;

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use tracing::{debug, warn};

use super::sql::{quote_ident, quote_literal, run};

/// A database file mounted on a pooled connection under a request-scoped alias.
///
/// Call [`AttachedSource::detach`] to release it. If the guard is dropped while the
/// alias is still mounted (early return, panic, cancelled future) the connection is
/// flagged to be closed instead of going back to the pool, which releases the
/// attachment and any transaction left open on it.
pub struct AttachedSource<'c> {
    conn: &'c mut PoolConnection<Sqlite>,
    alias: String,
    attached: bool,
}

impl<'c> AttachedSource<'c> {
    /// Mount `path` under a freshly generated alias.
    pub async fn attach(
        conn: &'c mut PoolConnection<Sqlite>,
        path: &Path,
    ) -> Result<AttachedSource<'c>, sqlx::Error> {
        let path = path.to_str().ok_or_else(|| {
            sqlx::Error::Configuration(
                format!("source path is not valid UTF-8: {}", path.display()).into(),
            )
        })?;
        let alias = generate_alias();

        run(
            &mut **conn,
            &format!(
                "ATTACH DATABASE {} AS {}",
                quote_literal(path),
                quote_ident(&alias)
            ),
        )
        .await?;
        debug!(alias = %alias, "source database attached");

        Ok(AttachedSource {
            conn,
            alias,
            attached: true,
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut **self.conn
    }

    /// Close the connection when it is released instead of returning it to the pool.
    pub fn discard_connection(&mut self) {
        self.conn.close_on_drop();
    }

    /// Detach, reporting failure. On failure the guard's drop discards the connection.
    pub async fn detach(mut self) -> Result<(), sqlx::Error> {
        self.detach_inner().await
    }

    /// Detach, ignoring failure. Returns whether the alias is now released.
    pub async fn try_detach(&mut self) -> bool {
        match self.detach_inner().await {
            Ok(()) => true,
            Err(e) => {
                debug!(alias = %self.alias, error = %e, "best-effort detach failed");
                false
            }
        }
    }

    async fn detach_inner(&mut self) -> Result<(), sqlx::Error> {
        if !self.attached {
            return Ok(());
        }
        let sql = format!("DETACH DATABASE {}", quote_ident(&self.alias));
        run(&mut **self.conn, &sql).await?;
        self.attached = false;
        debug!(alias = %self.alias, "source database detached");
        Ok(())
    }
}

impl Drop for AttachedSource<'_> {
    fn drop(&mut self) {
        if self.attached {
            warn!(
                alias = %self.alias,
                "source database still attached on release; discarding connection"
            );
            self.conn.close_on_drop();
        }
    }
}

/// Alias unique per call, so concurrent imports on different pooled connections never clash.
pub(crate) fn generate_alias() -> String {
    format!("src_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn aliases_are_valid_identifiers_and_distinct() {
        let aliases: HashSet<String> = (0..256).map(|_| generate_alias()).collect();
        assert_eq!(aliases.len(), 256);
        for alias in &aliases {
            assert!(alias.starts_with("src_"));
            assert!(alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }
}
