//! Repetition queries plus the timestamp conventions they rely on.
//!
//! Clients send either epoch seconds or epoch millis. Anything below
//! [`SECONDS_THRESHOLD`] is taken to be seconds. Stored timestamps are millis
//! truncated to UTC midnight, one row per (habit, day).

use sqlx::SqlitePool;
use tracing::debug;

use crate::db::models::Repetition;
use crate::error::LoopError;

/// Values below this are treated as seconds since the epoch.
pub const SECONDS_THRESHOLD: i64 = 100_000_000_000;

const MS_PER_DAY: i64 = 86_400_000;

/// `None` when scaling seconds to millis leaves the `i64` range.
pub fn normalize_to_millis(ts: i64) -> Option<i64> {
    if ts < SECONDS_THRESHOLD {
        ts.checked_mul(1000)
    } else {
        Some(ts)
    }
}

pub fn utc_midnight(epoch_ms: i64) -> Option<i64> {
    epoch_ms.checked_sub(epoch_ms.rem_euclid(MS_PER_DAY))
}

fn request_millis(ts: i64) -> Result<i64, LoopError> {
    normalize_to_millis(ts)
        .ok_or_else(|| LoopError::BadRequest(format!("Timestamp out of range: {ts}")))
}

fn request_day(ts: i64) -> Result<i64, LoopError> {
    utc_midnight(request_millis(ts)?)
        .ok_or_else(|| LoopError::BadRequest(format!("Timestamp out of range: {ts}")))
}

/// Repetitions with `from <= timestamp < to`, both bounds normalized to millis.
pub async fn list_range(pool: &SqlitePool, from: i64, to: i64) -> Result<Vec<Repetition>, LoopError> {
    let from_ms = request_millis(from)?;
    let to_ms = request_millis(to)?;

    let mut rows = sqlx::query_as::<_, Repetition>(
        r#"
        SELECT habit, timestamp, value, notes
        FROM Repetitions
        WHERE timestamp >= ? AND timestamp < ?
        ORDER BY timestamp ASC, habit ASC
        "#,
    )
    .bind(from_ms)
    .bind(to_ms)
    .fetch_all(pool)
    .await?;

    // Rows written by older clients may still hold seconds.
    for row in &mut rows {
        row.timestamp = normalize_to_millis(row.timestamp).unwrap_or(row.timestamp);
    }
    Ok(rows)
}

/// Insert or replace the repetition for `habit` on the day containing `timestamp`.
/// A `None` value removes that day's repetition instead.
pub async fn upsert(
    pool: &SqlitePool,
    habit: i64,
    timestamp: i64,
    value: Option<i64>,
    notes: Option<String>,
) -> Result<(), LoopError> {
    let day = request_day(timestamp)?;

    let mut tx = pool.begin().await?;
    match value {
        None => {
            sqlx::query("DELETE FROM Repetitions WHERE habit = ? AND timestamp = ?")
                .bind(habit)
                .bind(day)
                .execute(&mut *tx)
                .await?;
        }
        Some(value) => {
            sqlx::query(
                r#"
                INSERT INTO Repetitions (habit, timestamp, value, notes)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(habit, timestamp) DO UPDATE SET
                    value = excluded.value,
                    notes = excluded.notes
                "#,
            )
            .bind(habit)
            .bind(day)
            .bind(value)
            .bind(notes)
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;

    debug!(habit, day, deleted = value.is_none(), "repetition saved");
    Ok(())
}

pub async fn delete(pool: &SqlitePool, habit: i64, timestamp: i64) -> Result<u64, LoopError> {
    let day = request_day(timestamp)?;
    let res = sqlx::query("DELETE FROM Repetitions WHERE habit = ? AND timestamp = ?")
        .bind(habit)
        .bind(day)
        .execute(pool)
        .await?;

    debug!(habit, day, affected = res.rows_affected(), "repetition deleted");
    Ok(res.rows_affected())
}
