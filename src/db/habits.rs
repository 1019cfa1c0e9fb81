//! Habit queries. Plain parameter-to-statement translations over the pool.

use sqlx::SqlitePool;
use tracing::debug;

use crate::db::models::{Habit, HabitFields};
use crate::error::LoopError;

const HABIT_COLUMNS: &str = "id, archived, color, description, freq_den, freq_num, highlight, \
    name, position, reminder_hour, reminder_min, reminder_days, type, target_type, \
    target_value, unit, question, uuid";

pub async fn create(pool: &SqlitePool, fields: HabitFields) -> Result<Habit, LoopError> {
    let sql = format!(
        r#"
        INSERT INTO Habits (
            archived, color, description, freq_den, freq_num, highlight, name, position,
            reminder_hour, reminder_min, reminder_days, type, target_type, target_value,
            unit, question, uuid
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {HABIT_COLUMNS}
        "#
    );
    let habit = bind_fields(sqlx::query_as::<_, Habit>(&sql), fields)
        .fetch_one(pool)
        .await?;

    debug!(id = habit.id, "habit created");
    Ok(habit)
}

/// Overwrite every editable column of habit `id`.
pub async fn update(pool: &SqlitePool, id: i64, fields: HabitFields) -> Result<Habit, LoopError> {
    let sql = format!(
        r#"
        UPDATE Habits
        SET
            archived = ?, color = ?, description = ?, freq_den = ?, freq_num = ?,
            highlight = ?, name = ?, position = ?, reminder_hour = ?, reminder_min = ?,
            reminder_days = ?, type = ?, target_type = ?, target_value = ?, unit = ?,
            question = ?, uuid = ?
        WHERE id = ?
        RETURNING {HABIT_COLUMNS}
        "#
    );
    bind_fields(sqlx::query_as::<_, Habit>(&sql), fields)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LoopError::NotFound(format!("Habit not found with id {id}")))
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Habit>, LoopError> {
    let sql = format!("SELECT {HABIT_COLUMNS} FROM Habits WHERE id = ?");
    let habit = sqlx::query_as::<_, Habit>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(habit)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Habit>, LoopError> {
    let sql = format!("SELECT {HABIT_COLUMNS} FROM Habits ORDER BY position, id");
    let habits = sqlx::query_as::<_, Habit>(&sql).fetch_all(pool).await?;
    Ok(habits)
}

/// Set only the description. Affects zero rows silently when `id` is unknown.
pub async fn patch_description(
    pool: &SqlitePool,
    id: i64,
    description: &str,
) -> Result<(), LoopError> {
    let res = sqlx::query("UPDATE Habits SET description = ? WHERE id = ?")
        .bind(description)
        .bind(id)
        .execute(pool)
        .await?;

    debug!(id, affected = res.rows_affected(), "habit description patched");
    Ok(())
}

/// Assign `position = index` to each id, all in one transaction.
pub async fn reorder(pool: &SqlitePool, ids: &[i64]) -> Result<(), LoopError> {
    let mut tx = pool.begin().await?;
    for (position, id) in ids.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| LoopError::BadRequest("Order list is too long.".to_string()))?;
        sqlx::query("UPDATE Habits SET position = ? WHERE id = ?")
            .bind(position)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    debug!(count = ids.len(), "habits reordered");
    Ok(())
}

fn bind_fields<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Sqlite, Habit, sqlx::sqlite::SqliteArguments<'q>>,
    f: HabitFields,
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, Habit, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(f.archived)
        .bind(f.color)
        .bind(f.description)
        .bind(f.freq_den)
        .bind(f.freq_num)
        .bind(f.highlight)
        .bind(f.name)
        .bind(f.position)
        .bind(f.reminder_hour)
        .bind(f.reminder_min)
        .bind(f.reminder_days)
        .bind(f.habit_type)
        .bind(f.target_type)
        .bind(f.target_value)
        .bind(f.unit)
        .bind(f.question)
        .bind(f.uuid)
}
