//! Queries for `user_sessions`: one row per student, keyed by access code.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSessionRow {
    pub student_id: String,
    pub access_code: String,
    pub access_code_generated_at: DateTime<Utc>,
    pub cookies_json: String,
    pub cookies_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

pub async fn get_by_student_id<'e, E>(
    executor: E,
    student_id: &str,
) -> Result<Option<UserSessionRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM user_sessions WHERE student_id = ?")
        .bind(student_id)
        .fetch_optional(executor)
        .await
}

pub async fn get_by_access_code<'e, E>(
    executor: E,
    access_code: &str,
) -> Result<Option<UserSessionRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as("SELECT * FROM user_sessions WHERE access_code = ?")
        .bind(access_code)
        .fetch_optional(executor)
        .await
}

/// Insert a freshly created session. All timestamps start at `now`.
pub async fn insert<'e, E>(
    executor: E,
    student_id: &str,
    access_code: &str,
    cookies_json: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO user_sessions
            (student_id, access_code, access_code_generated_at, cookies_json,
             cookies_updated_at, created_at, last_accessed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(student_id)
    .bind(access_code)
    .bind(now)
    .bind(cookies_json)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Rotate the access code and cookies in one statement. Every freshness
/// timestamp moves to `now`.
pub async fn rotate_credentials<'e, E>(
    executor: E,
    student_id: &str,
    new_access_code: &str,
    cookies_json: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE user_sessions
        SET access_code = ?,
            access_code_generated_at = ?,
            cookies_json = ?,
            cookies_updated_at = ?,
            last_accessed_at = ?
        WHERE student_id = ?
        "#,
    )
    .bind(new_access_code)
    .bind(now)
    .bind(cookies_json)
    .bind(now)
    .bind(now)
    .bind(student_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn touch_last_accessed<'e, E>(
    executor: E,
    student_id: &str,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE user_sessions SET last_accessed_at = ? WHERE student_id = ?")
        .bind(now)
        .bind(student_id)
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_pool;

    #[tokio::test]
    async fn insert_and_lookup_by_both_keys() {
        let pool = test_pool().await;
        let now = Utc::now();
        insert(&pool, "S1", "code-1", "[]", now).await.unwrap();

        let by_student = get_by_student_id(&pool, "S1").await.unwrap().unwrap();
        assert_eq!(by_student.access_code, "code-1");
        let by_code = get_by_access_code(&pool, "code-1").await.unwrap().unwrap();
        assert_eq!(by_code.student_id, "S1");
        assert!(get_by_access_code(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_student_id_is_rejected() {
        let pool = test_pool().await;
        let now = Utc::now();
        insert(&pool, "S1", "code-1", "[]", now).await.unwrap();
        assert!(insert(&pool, "S1", "code-2", "[]", now).await.is_err());
    }

    #[tokio::test]
    async fn access_code_is_unique_across_sessions() {
        let pool = test_pool().await;
        let now = Utc::now();
        insert(&pool, "S1", "code-1", "[]", now).await.unwrap();
        assert!(insert(&pool, "S2", "code-1", "[]", now).await.is_err());
    }

    #[tokio::test]
    async fn rotation_replaces_code_and_cookies() {
        let pool = test_pool().await;
        let created = Utc::now() - chrono::Duration::hours(30);
        insert(&pool, "S1", "old-code", "[]", created).await.unwrap();

        let now = Utc::now();
        rotate_credentials(&pool, "S1", "new-code", r#"[{"name":"a","value":"1"}]"#, now)
            .await
            .unwrap();

        let row = get_by_student_id(&pool, "S1").await.unwrap().unwrap();
        assert_eq!(row.access_code, "new-code");
        assert!(row.cookies_json.contains("\"a\""));
        assert!(row.cookies_updated_at > created);
        assert!(get_by_access_code(&pool, "old-code").await.unwrap().is_none());
    }
}
