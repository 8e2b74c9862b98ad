//! Application assembly: pool, migrations, HTTP client, server lifecycle.

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::Config;
use crate::state::AppState;
use crate::web::create_router;

/// Default per-attempt timeout for upstream requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// Create an App with all shared components initialized.
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let db_pool = Self::connect_database(&config.database_url).await?;

        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed");

        // Redirects are never followed: the sync engine reads 3xx statuses
        // as "session expired" signals.
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        let upstream_base = Url::parse(&config.upstream_base_url)
            .context("Failed to parse UPSTREAM_BASE_URL")?;

        if config.rate_limiting_enabled {
            info!(
                redis_host = config.redis_host.as_str(),
                redis_port = config.redis_port,
                redis_db = config.redis_db,
                "rate limiting delegated to external limiter"
            );
        }

        let state = AppState::new(db_pool, http, upstream_base);
        Ok(Self { config, state })
    }

    async fn connect_database(database_url: &str) -> Result<SqlitePool, anyhow::Error> {
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .context("Failed to parse database URL")?
            .create_if_missing(true)
            .foreign_keys(true);

        let db_pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(4))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(max_connections = 4, "database pool established");
        Ok(db_pool)
    }

    /// Serve the API until ctrl-c.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let router = create_router(self.state);
        let addr = format!("0.0.0.0:{}", self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!(addr = addr.as_str(), "listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;
        info!("shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}
