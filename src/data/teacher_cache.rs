//! Process-global teacher directory cache, backed by the `teacher_cache`
//! table.
//!
//! The cache is shared across students by design: reads go straight to the
//! database and writers are serialized by the enclosing transaction, so no
//! in-process synchronization is needed.

use chrono::{DateTime, Duration, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

/// How long a cached teacher entry stays valid.
pub const TEACHER_CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, sqlx::FromRow)]
struct TeacherCacheRow {
    initials: String,
    full_name: String,
}

/// Read the cached map from all non-expired rows. `None` when the cache is
/// empty or fully expired.
pub async fn get_teacher_map(pool: &SqlitePool) -> Result<Option<HashMap<String, String>>, sqlx::Error> {
    let now = Utc::now();
    let rows: Vec<TeacherCacheRow> =
        sqlx::query_as("SELECT initials, full_name FROM teacher_cache WHERE expires_at > ?")
            .bind(now)
            .fetch_all(pool)
            .await?;
    if rows.is_empty() {
        debug!("teacher cache empty or expired");
        return Ok(None);
    }
    Ok(Some(
        rows.into_iter().map(|r| (r.initials, r.full_name)).collect(),
    ))
}

/// Replace the cached rows for the given initials with fresh entries.
///
/// Delete + insert runs in one transaction so readers never observe a
/// partially refreshed directory.
pub async fn store_teacher_map(
    pool: &SqlitePool,
    teacher_map: &HashMap<String, String>,
) -> Result<(), sqlx::Error> {
    if teacher_map.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let expires_at: DateTime<Utc> = now + Duration::hours(TEACHER_CACHE_TTL_HOURS);

    let mut tx = pool.begin().await?;

    let mut delete: QueryBuilder<Sqlite> =
        QueryBuilder::new("DELETE FROM teacher_cache WHERE initials IN (");
    let mut separated = delete.separated(", ");
    for initials in teacher_map.keys() {
        separated.push_bind(initials);
    }
    separated.push_unseparated(")");
    delete.build().execute(&mut *tx).await?;

    let mut insert: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO teacher_cache (initials, full_name, cached_at, expires_at) ");
    insert.push_values(teacher_map, |mut b, (initials, full_name)| {
        b.push_bind(initials)
            .push_bind(full_name)
            .push_bind(now)
            .push_bind(expires_at);
    });
    insert.build().execute(&mut *tx).await?;

    tx.commit().await?;
    info!(entries = teacher_map.len(), "teacher cache refreshed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_pool;

    fn sample_map() -> HashMap<String, String> {
        HashMap::from([
            ("JOH".to_string(), "Jón Johansen".to_string()),
            ("AD".to_string(), "Anna Dam".to_string()),
        ])
    }

    #[tokio::test]
    async fn empty_cache_reads_none() {
        let pool = test_pool().await;
        assert!(get_teacher_map(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_then_read_round_trips() {
        let pool = test_pool().await;
        store_teacher_map(&pool, &sample_map()).await.unwrap();
        let map = get_teacher_map(&pool).await.unwrap().unwrap();
        assert_eq!(map, sample_map());
    }

    #[tokio::test]
    async fn restore_replaces_existing_entries() {
        let pool = test_pool().await;
        store_teacher_map(&pool, &sample_map()).await.unwrap();

        let updated = HashMap::from([("JOH".to_string(), "Jón á Gøtu".to_string())]);
        store_teacher_map(&pool, &updated).await.unwrap();

        let map = get_teacher_map(&pool).await.unwrap().unwrap();
        assert_eq!(map.get("JOH").map(String::as_str), Some("Jón á Gøtu"));
        // Untouched initials survive alongside the refreshed one.
        assert_eq!(map.get("AD").map(String::as_str), Some("Anna Dam"));
    }

    #[tokio::test]
    async fn expired_entries_are_ignored() {
        let pool = test_pool().await;
        store_teacher_map(&pool, &sample_map()).await.unwrap();

        let past = Utc::now() - Duration::hours(1);
        sqlx::query("UPDATE teacher_cache SET expires_at = ?")
            .bind(past)
            .execute(&pool)
            .await
            .unwrap();

        assert!(get_teacher_map(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cached_at_precedes_expires_at() {
        let pool = test_pool().await;
        store_teacher_map(&pool, &sample_map()).await.unwrap();
        let stale: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM teacher_cache WHERE cached_at >= expires_at",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(stale, 0);
    }
}
