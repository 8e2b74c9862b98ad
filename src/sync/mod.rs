//! The sync engine and its supporting pieces: per-week pipeline, multi-week
//! orchestration, diffing, and the public error surface.

pub mod diff;
pub mod engine;
pub mod orchestrator;
pub mod pipeline;

pub use engine::SyncService;

use crate::upstream::errors::{BootstrapError, UpstreamError};

/// Public failure kinds of the sync engine. The web layer maps these onto
/// HTTP statuses; everything below the engine stays in its own error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Missing X-Access-Code header")]
    Unauthenticated,
    #[error("Invalid access code")]
    Forbidden,
    #[error("Authentication failed with the upstream. Check cookies.")]
    AuthFailed,
    #[error("Cookies expired")]
    CookiesExpired,
    #[error("A session already exists for student {0}")]
    AlreadyExists(String),
    #[error("No session found for student {0}")]
    NotFound(String),
    #[error("Upstream response did not contain the expected session markers")]
    UpstreamProtocolError,
    #[error("Upstream returned HTTP {0}")]
    UpstreamHttp(u16),
    #[error("Network error communicating with the upstream")]
    UpstreamTransport,
    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl SyncError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(message.into()))
    }
}

impl From<BootstrapError> for SyncError {
    fn from(e: BootstrapError) -> Self {
        match e {
            BootstrapError::AuthFailed(_) => Self::AuthFailed,
            BootstrapError::MissingSessionToken => Self::UpstreamProtocolError,
            BootstrapError::Upstream(inner) => inner.into(),
        }
    }
}

impl From<UpstreamError> for SyncError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Http { status, .. } => Self::UpstreamHttp(status),
            UpstreamError::Transport(_) => Self::UpstreamTransport,
            UpstreamError::InvalidUrl(e) => Self::Internal(e.into()),
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.into())
    }
}
