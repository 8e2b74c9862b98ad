//! Application state shared across web handlers.

use sqlx::SqlitePool;
use url::Url;

use crate::sync::SyncService;

/// Process-wide shared handles: the database pool and the HTTP client are
/// both singletons with lifecycle tied to application startup/shutdown.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub http: reqwest::Client,
    pub upstream_base: Url,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, http: reqwest::Client, upstream_base: Url) -> Self {
        Self {
            db_pool,
            http,
            upstream_base,
        }
    }

    /// Request-scoped sync engine over the shared handles.
    pub fn sync_service(&self) -> SyncService {
        SyncService::new(
            self.db_pool.clone(),
            self.http.clone(),
            self.upstream_base.clone(),
        )
    }
}
