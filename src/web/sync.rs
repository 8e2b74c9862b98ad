//! Handlers for the synchronization endpoints.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::{parse_cookie_string, Cookie, TimetableData};
use crate::state::AppState;
use crate::sync::engine::SyncReport;
use crate::sync::orchestrator::OffsetSelector;
use crate::sync::SyncError;
use crate::web::error::ApiJson;

/// Cookies arrive either as structured records (browser exports) or, from
/// older clients, as one raw `name=value; ...` string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CookiesField {
    Records(Vec<Cookie>),
    Legacy(String),
}

impl CookiesField {
    pub fn into_cookies(self) -> Vec<Cookie> {
        match self {
            Self::Records(cookies) => cookies,
            Self::Legacy(raw) => parse_cookie_string(&raw),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InitialSyncRequest {
    pub student_id: String,
    pub cookies: CookiesField,
}

#[derive(Debug, Serialize)]
pub struct InitialSyncResponse {
    pub access_code: String,
    pub initial_data: Vec<TimetableData>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub offsets: OffsetSelector,
}

#[derive(Debug, Deserialize)]
pub struct SessionRefreshRequest {
    pub student_id: String,
    pub new_cookies: CookiesField,
}

#[derive(Debug, Serialize)]
pub struct SessionRefreshResponse {
    pub access_code: String,
}

/// `POST /sync/initial`
pub async fn initial_sync(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InitialSyncRequest>,
) -> Result<(StatusCode, Json<InitialSyncResponse>), SyncError> {
    let (access_code, initial_data) = state
        .sync_service()
        .initial_sync(&request.student_id, request.cookies.into_cookies())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(InitialSyncResponse {
            access_code,
            initial_data,
        }),
    ))
}

/// `POST /sync`, authenticated by the `X-Access-Code` header.
pub async fn sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<SyncRequest>,
) -> Result<Json<SyncReport>, SyncError> {
    let access_code = headers
        .get("x-access-code")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(SyncError::Unauthenticated)?;
    let report = state
        .sync_service()
        .sync(access_code, request.offsets)
        .await?;
    Ok(Json(report))
}

/// `POST /session/refresh`
pub async fn refresh_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SessionRefreshRequest>,
) -> Result<Json<SessionRefreshResponse>, SyncError> {
    let access_code = state
        .sync_service()
        .session_refresh(&request.student_id, request.new_cookies.into_cookies())
        .await?;
    Ok(Json(SessionRefreshResponse { access_code }))
}
