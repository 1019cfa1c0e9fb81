use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Every client-editable column of a habit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HabitFields {
    pub archived: Option<bool>,
    pub color: Option<i64>,
    pub description: Option<String>,
    pub freq_den: Option<i64>,
    pub freq_num: Option<i64>,
    pub highlight: Option<bool>,
    pub name: Option<String>,
    pub position: Option<i64>,
    pub reminder_hour: Option<i64>,
    pub reminder_min: Option<i64>,
    /// Weekday bitmask; 127 means every day.
    #[serde(default = "default_reminder_days")]
    pub reminder_days: i64,
    #[serde(rename = "type", default)]
    #[sqlx(rename = "type")]
    pub habit_type: i64,
    #[serde(default)]
    pub target_type: i64,
    #[serde(default)]
    pub target_value: f64,
    #[serde(default)]
    pub unit: String,
    pub question: Option<String>,
    pub uuid: Option<String>,
}

impl Default for HabitFields {
    fn default() -> Self {
        Self {
            archived: None,
            color: None,
            description: None,
            freq_den: None,
            freq_num: None,
            highlight: None,
            name: None,
            position: None,
            reminder_hour: None,
            reminder_min: None,
            reminder_days: default_reminder_days(),
            habit_type: 0,
            target_type: 0,
            target_value: 0.0,
            unit: String::new(),
            question: None,
            uuid: None,
        }
    }
}

fn default_reminder_days() -> i64 {
    127
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Habit {
    pub id: i64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: HabitFields,
}

/// A repetition as returned by the listing endpoint; `timestamp` is always epoch millis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Repetition {
    pub habit: i64,
    pub timestamp: i64,
    pub value: Option<i64>,
    pub notes: Option<String>,
}
