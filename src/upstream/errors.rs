//! Error types for the upstream client.

/// Failure talking to the upstream after the retry budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream returned HTTP {status} for {url}")]
    Http { status: u16, url: String },
    #[error("transport error talking to upstream: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl UpstreamError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidUrl(_) => None,
        }
    }

    /// Whether this failure should feed the concurrency coordinator's
    /// failure signal (rate limiting or upstream overload).
    pub fn is_retry_eligible(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 503),
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::InvalidUrl(_) => false,
        }
    }
}

/// Failure validating a cookie set against the upstream's base page.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("upstream rejected cookies with HTTP {0}")]
    AuthFailed(u16),
    #[error("upstream page did not contain a session token")]
    MissingSessionToken,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
