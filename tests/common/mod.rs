#![allow(dead_code)]

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, SqliteConnection, SqlitePool};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LiveDb {
    pub dir: TempDir,
    pub path: PathBuf,
    pub pool: SqlitePool,
}

impl LiveDb {
    pub fn transfer(&self) -> loop_server::DatabaseTransfer {
        loop_server::DatabaseTransfer::new(self.pool.clone(), BUSY_TIMEOUT)
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// A live database with the application schema, served by the regular pool setup.
pub async fn live_db() -> LiveDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("live.db");
    let pool = loop_server::db::connect(&format!("sqlite:{}", path.display()), BUSY_TIMEOUT)
        .await
        .expect("connect live db");
    LiveDb { dir, path, pool }
}

/// A live database without any tables, behind a pool of at most `max_connections`.
pub async fn bare_live_db(max_connections: u32) -> LiveDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("live.db");
    let opts = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await
        .expect("connect bare live db");
    LiveDb { dir, path, pool }
}

/// Create a standalone database at `path` by running `statements` in order.
pub async fn write_db(path: &Path, statements: &[&str]) {
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&opts)
        .await
        .expect("open source db");
    for stmt in statements {
        sqlx::raw_sql(stmt)
            .execute(&mut conn)
            .await
            .unwrap_or_else(|e| panic!("statement failed: {stmt}: {e}"));
    }
    conn.close().await.expect("close source db");
}

pub async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::raw_sql(sql)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("statement failed: {sql}: {e}"));
}

pub async fn habit_rows(pool: &SqlitePool) -> Vec<(i64, Option<String>)> {
    sqlx::query_as("SELECT id, name FROM Habits ORDER BY id")
        .fetch_all(pool)
        .await
        .expect("select habits")
}

pub async fn user_version(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .expect("user_version")
}

/// Names and DDL of every object in `main`, reserved entries included.
pub async fn schema_objects(pool: &SqlitePool) -> Vec<(String, String, Option<String>)> {
    sqlx::query_as("SELECT type, name, sql FROM main.sqlite_master ORDER BY type, name")
        .fetch_all(pool)
        .await
        .expect("sqlite_master")
}
