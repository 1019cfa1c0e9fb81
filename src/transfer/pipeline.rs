//! The ordered list of steps that replaces `main` with an attached source schema.
//!
//! Drops go dependents-first (views, triggers, indexes, then tables); creation goes
//! tables-first, then data, then dependents, then the schema version counter.

use sqlx::SqliteConnection;
use tracing::debug;

use super::catalog::{self, MAIN_SCHEMA, SchemaObjectKind};
use super::sql::{quote_ident, run};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DropViews,
    DropTriggers,
    DropIndexes,
    DropTables,
    CreateTables,
    CopyData,
    CreateViews,
    CreateIndexes,
    CreateTriggers,
    CopyVersion,
}

pub const REPLACE_PIPELINE: [Phase; 10] = [
    Phase::DropViews,
    Phase::DropTriggers,
    Phase::DropIndexes,
    Phase::DropTables,
    Phase::CreateTables,
    Phase::CopyData,
    Phase::CreateViews,
    Phase::CreateIndexes,
    Phase::CreateTriggers,
    Phase::CopyVersion,
];

/// Counts gathered while running the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub dropped: usize,
    pub tables: usize,
    pub rows: u64,
    pub views: usize,
    pub indexes: usize,
    pub triggers: usize,
    pub user_version: i64,
}

impl Phase {
    /// Run this phase against `main`, reading from the schema attached as `source`.
    pub async fn apply(
        self,
        conn: &mut SqliteConnection,
        source: &str,
        summary: &mut ImportSummary,
    ) -> Result<(), sqlx::Error> {
        match self {
            Phase::DropViews => drop_all(conn, SchemaObjectKind::View, summary).await,
            Phase::DropTriggers => drop_all(conn, SchemaObjectKind::Trigger, summary).await,
            Phase::DropIndexes => drop_all(conn, SchemaObjectKind::Index, summary).await,
            Phase::DropTables => drop_all(conn, SchemaObjectKind::Table, summary).await,
            Phase::CreateTables => {
                summary.tables = replay(conn, source, SchemaObjectKind::Table).await?;
                Ok(())
            }
            Phase::CopyData => {
                summary.rows = copy_rows(conn, source).await?;
                Ok(())
            }
            Phase::CreateViews => {
                summary.views = replay(conn, source, SchemaObjectKind::View).await?;
                Ok(())
            }
            Phase::CreateIndexes => {
                summary.indexes = replay(conn, source, SchemaObjectKind::Index).await?;
                Ok(())
            }
            Phase::CreateTriggers => {
                summary.triggers = replay(conn, source, SchemaObjectKind::Trigger).await?;
                Ok(())
            }
            Phase::CopyVersion => {
                let version = catalog::read_int_pragma(conn, source, "user_version").await?;
                run(
                    conn,
                    &format!("PRAGMA {}.user_version = {version}", quote_ident(MAIN_SCHEMA)),
                )
                .await?;
                summary.user_version = version;
                Ok(())
            }
        }
    }
}

async fn drop_all(
    conn: &mut SqliteConnection,
    kind: SchemaObjectKind,
    summary: &mut ImportSummary,
) -> Result<(), sqlx::Error> {
    // Collect every statement first; the catalog cursor must be closed before DDL runs.
    let drops: Vec<String> = catalog::list_object_names(conn, MAIN_SCHEMA, kind)
        .await?
        .iter()
        .map(|name| {
            format!(
                "DROP {} IF EXISTS {}.{}",
                kind.drop_keyword(),
                quote_ident(MAIN_SCHEMA),
                quote_ident(name)
            )
        })
        .collect();

    for stmt in &drops {
        run(conn, stmt).await?;
    }
    debug!(kind = kind.as_str(), count = drops.len(), "dropped from main");
    summary.dropped += drops.len();
    Ok(())
}

async fn replay(
    conn: &mut SqliteConnection,
    source: &str,
    kind: SchemaObjectKind,
) -> Result<usize, sqlx::Error> {
    let ddls = catalog::list_object_ddl(conn, source, kind).await?;
    for ddl in &ddls {
        run(conn, ddl).await?;
    }
    debug!(kind = kind.as_str(), count = ddls.len(), "recreated in main");
    Ok(ddls.len())
}

async fn copy_rows(conn: &mut SqliteConnection, source: &str) -> Result<u64, sqlx::Error> {
    let mut copied = 0;
    for table in catalog::list_tables(conn, source).await? {
        let columns = catalog::list_columns(conn, source, &table).await?;
        let Some(stmt) = insert_select_sql(source, &table, &columns) else {
            debug!(table = %table, "no columns; skipping data copy");
            continue;
        };
        let rows = run(conn, &stmt).await?;
        debug!(table = %table, rows, "rows copied");
        copied += rows;
    }
    Ok(copied)
}

/// `INSERT INTO main.t (cols) SELECT cols FROM source.t`, mapping columns by name in the
/// source's declaration order. `None` when the table has no columns.
pub(crate) fn insert_select_sql(source: &str, table: &str, columns: &[String]) -> Option<String> {
    if columns.is_empty() {
        return None;
    }
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "INSERT INTO {main}.{table} ({column_list}) SELECT {column_list} FROM {source}.{table}",
        main = quote_ident(MAIN_SCHEMA),
        table = quote_ident(table),
        source = quote_ident(source),
    ))
}
