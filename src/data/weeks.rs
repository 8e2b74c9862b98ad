//! Queries for `weekly_timetable_states`: one snapshot per (student, week).

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeeklyStateRow {
    pub id: i64,
    pub student_id: String,
    pub week_key: String,
    pub timetable_json: String,
    pub last_updated_at: DateTime<Utc>,
}

pub async fn get<'e, E>(
    executor: E,
    student_id: &str,
    week_key: &str,
) -> Result<Option<WeeklyStateRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM weekly_timetable_states WHERE student_id = ? AND week_key = ?")
        .bind(student_id)
        .bind(week_key)
        .fetch_optional(executor)
        .await
}

/// Insert or replace the stored snapshot for one (student, week).
pub async fn upsert<'e, E>(
    executor: E,
    student_id: &str,
    week_key: &str,
    timetable_json: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO weekly_timetable_states (student_id, week_key, timetable_json, last_updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (student_id, week_key)
        DO UPDATE SET timetable_json = excluded.timetable_json,
                      last_updated_at = excluded.last_updated_at
        "#,
    )
    .bind(student_id)
    .bind(week_key)
    .bind(timetable_json)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}
