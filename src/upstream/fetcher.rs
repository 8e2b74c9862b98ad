//! Retrying request primitive over the shared HTTP client.
//!
//! One fetcher wraps one authenticated upstream session: it renders the
//! session's cookies into a `Cookie` header on every request, merges
//! browser-mimicking default headers, and retries transient failures with
//! exponential backoff. The underlying `reqwest::Client` is the process
//! singleton and is never torn down here.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, USER_AGENT};
use reqwest::{Method, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::models::{cookie_header, Cookie};
use crate::upstream::coordinator::{ConcurrencyCoordinator, NullCoordinator};
use crate::upstream::errors::UpstreamError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Session-scoped HTTP primitive with retries and backoff.
#[derive(Clone)]
pub struct UpstreamFetcher {
    http: reqwest::Client,
    base: Url,
    cookie_header: Option<HeaderValue>,
    max_retries: u32,
    backoff: Duration,
    timeout: Option<Duration>,
    coordinator: Arc<dyn ConcurrencyCoordinator>,
    force_max_concurrency: bool,
}

impl UpstreamFetcher {
    pub fn new(http: reqwest::Client, base: Url, cookies: &[Cookie]) -> Self {
        let cookie_header = if cookies.is_empty() {
            None
        } else {
            HeaderValue::from_str(&cookie_header(cookies)).ok()
        };
        Self {
            http,
            base,
            cookie_header,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
            timeout: None,
            coordinator: Arc::new(NullCoordinator),
            force_max_concurrency: false,
        }
    }

    pub fn with_retry_policy(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.backoff = backoff;
        self
    }

    /// Per-request timeout override; the shared client's 30 s default applies
    /// otherwise.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the default [`NullCoordinator`] with an adaptive policy.
    pub fn with_coordinator(mut self, coordinator: Arc<dyn ConcurrencyCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Suppress coordinator callbacks for requests that must not influence
    /// the adaptive fan-out.
    pub fn with_force_max_concurrency(mut self, force: bool) -> Self {
        self.force_max_concurrency = force;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// GET a path (relative to the base URL) or an absolute URL.
    pub async fn get(&self, path: &str) -> Result<Response, UpstreamError> {
        self.request(Method::GET, path, None, None).await
    }

    /// GET with caller headers merged over the defaults.
    pub async fn get_with_headers(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> Result<Response, UpstreamError> {
        self.request(Method::GET, path, None, Some(headers)).await
    }

    /// POST a form body. `Content-Type: application/x-www-form-urlencoded`
    /// is implied by the body encoding unless the caller overrides it.
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Response, UpstreamError> {
        self.request(Method::POST, path, Some(form), None).await
    }

    /// POST a form body with caller headers merged over the defaults.
    pub async fn post_form_with_headers(
        &self,
        path: &str,
        form: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<Response, UpstreamError> {
        self.request(Method::POST, path, Some(form), Some(headers))
            .await
    }

    fn resolve_url(&self, path: &str) -> Result<Url, UpstreamError> {
        if path.starts_with("http") {
            return Ok(Url::parse(path)?);
        }
        let joined = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        if let Some(cookie) = &self.cookie_header {
            headers.insert(COOKIE, cookie.clone());
        }
        headers
    }

    fn report_success(&self) {
        if self.force_max_concurrency {
            return;
        }
        self.coordinator.report_success();
    }

    fn report_failure(&self, error: &UpstreamError) {
        if self.force_max_concurrency || !error.is_retry_eligible() {
            return;
        }
        self.coordinator.report_failure();
    }

    /// Run one request with up to `max_retries` attempts.
    ///
    /// 2xx and 3xx responses return immediately (3xx signal an expired
    /// upstream session and are interpreted downstream); 4xx/5xx and
    /// transport errors feed the retry loop, sleeping
    /// `backoff * 2^(attempt-1)` between attempts.
    async fn request(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(&str, String)]>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, UpstreamError> {
        let url = self.resolve_url(path)?;
        let mut attempt: u32 = 0;
        let mut last_error: Option<UpstreamError> = None;

        while attempt < self.max_retries {
            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .headers(self.default_headers());
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(form) = form {
                builder = builder.form(form);
            }
            // Caller headers win over the defaults (and over the implied
            // form Content-Type).
            if let Some(extra) = &extra_headers {
                builder = builder.headers(extra.clone());
            }

            let error = match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() || status.is_redirection() {
                        self.report_success();
                        return Ok(response);
                    }
                    UpstreamError::Http {
                        status: status.as_u16(),
                        url: url.to_string(),
                    }
                }
                Err(e) => UpstreamError::Transport(e),
            };

            self.report_failure(&error);
            attempt += 1;
            warn!(
                method = %method,
                url = %url,
                attempt,
                max_retries = self.max_retries,
                error = %error,
                "upstream request attempt failed"
            );
            last_error = Some(error);
            if attempt >= self.max_retries {
                break;
            }
            let sleep = self.backoff * 2u32.pow(attempt - 1);
            debug!(sleep_ms = sleep.as_millis() as u64, "backing off before retry");
            tokio::time::sleep(sleep).await;
        }

        // max_retries >= 1, so an error was always recorded by the time the
        // loop falls through.
        Err(last_error.unwrap_or(UpstreamError::Http {
            status: 0,
            url: url.to_string(),
        }))
    }
}
