//! SQL DDL for initializing the database schema.

use sqlx::SqlitePool;

use crate::error::LoopError;

/// SQLite schema includes:
/// - `Habits` table (one tracked habit per row)
/// - `Repetitions` table (one check-in per habit per UTC day)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Habits
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS Habits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    archived INTEGER,
    color INTEGER,
    description TEXT,
    freq_den INTEGER,
    freq_num INTEGER,
    highlight INTEGER,
    name TEXT,
    position INTEGER,
    reminder_hour INTEGER,
    reminder_min INTEGER,
    reminder_days INTEGER NOT NULL DEFAULT 127,
    type INTEGER NOT NULL DEFAULT 0,
    target_type INTEGER NOT NULL DEFAULT 0,
    target_value REAL NOT NULL DEFAULT 0,
    unit TEXT NOT NULL DEFAULT '',
    question TEXT,
    uuid TEXT
);

-- ---------------------------------------------------------------------------
-- Repetitions (timestamp is epoch millis truncated to UTC midnight)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS Repetitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    habit INTEGER NOT NULL REFERENCES Habits(id),
    timestamp INTEGER NOT NULL,
    value INTEGER NOT NULL,
    notes TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_repetitions_habit_timestamp ON Repetitions(habit, timestamp);
"#;

pub(crate) async fn apply_schema(pool: &SqlitePool) -> Result<(), LoopError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
