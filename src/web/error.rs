//! HTTP mapping of the sync engine's public error kinds.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::sync::SyncError;

impl SyncError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::AuthFailed | Self::CookiesExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamProtocolError | Self::UpstreamHttp(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTransport => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable tag for errors clients branch on.
    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::CookiesExpired => Some("COOKIES_EXPIRED"),
            _ => None,
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }
        let mut body = json!({ "detail": self.to_string() });
        if let Some(code) = self.error_code() {
            body["error_code"] = json!(code);
        }
        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejection becomes a `BadRequest` with the same
/// `{detail}` shape as every other error.
#[derive(Debug, axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(SyncError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for SyncError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
