//! Database access: schema models and queries.
//!
//! Every function takes an executor so the sync engine can run reads against
//! the pool and writes inside its per-request transaction.

pub mod sessions;
pub mod teacher_cache;
pub mod weeks;

#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    // In-memory sqlite is per-connection; a single-connection pool keeps all
    // queries on the same database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}
