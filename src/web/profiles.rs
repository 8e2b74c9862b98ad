//! Legacy read-only timetable views.
//!
//! These endpoints authenticate with a raw `Cookie` header per request and
//! return `TimetableData` directly, with no persistence or diffing. They
//! predate the access-code session model and are kept for older clients.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::models::{parse_cookie_string, Cookie, TimetableData};
use crate::state::AppState;
use crate::sync::engine::ProfileSelection;
use crate::sync::SyncError;

#[derive(Debug, Deserialize)]
pub struct StudentQuery {
    pub student_id: String,
}

fn cookies_from_headers(headers: &HeaderMap) -> Result<Vec<Cookie>, SyncError> {
    let raw = headers
        .get(axum::http::header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| SyncError::BadRequest("Cookie header is required".into()))?;
    let cookies = parse_cookie_string(raw);
    if cookies.is_empty() {
        return Err(SyncError::BadRequest("Cookie header is required".into()));
    }
    Ok(cookies)
}

/// `GET /profiles/{username}/weeks/{offset}`
pub async fn week_by_offset(
    State(state): State<AppState>,
    Path((_username, offset)): Path<(String, i32)>,
    Query(query): Query<StudentQuery>,
    headers: HeaderMap,
) -> Result<Json<TimetableData>, SyncError> {
    let cookies = cookies_from_headers(&headers)?;
    let mut weeks = state
        .sync_service()
        .fetch_weeks_readonly(cookies, &query.student_id, ProfileSelection::Offset(offset))
        .await?;
    weeks
        .pop()
        .map(Json)
        .ok_or_else(|| SyncError::internal("single-week fetch returned nothing"))
}

/// `GET /profiles/{username}/weeks/all`
pub async fn all_weeks(
    State(state): State<AppState>,
    Path(_username): Path<String>,
    Query(query): Query<StudentQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<TimetableData>>, SyncError> {
    let cookies = cookies_from_headers(&headers)?;
    let weeks = state
        .sync_service()
        .fetch_weeks_readonly(cookies, &query.student_id, ProfileSelection::All)
        .await?;
    Ok(Json(weeks))
}

/// `GET /profiles/{username}/weeks/current_forward`
pub async fn current_forward_weeks(
    State(state): State<AppState>,
    Path(_username): Path<String>,
    Query(query): Query<StudentQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<TimetableData>>, SyncError> {
    let cookies = cookies_from_headers(&headers)?;
    let weeks = state
        .sync_service()
        .fetch_weeks_readonly(cookies, &query.student_id, ProfileSelection::CurrentForward)
        .await?;
    Ok(Json(weeks))
}

/// `GET /profiles/{username}/weeks/forward/{count}`
pub async fn forward_weeks(
    State(state): State<AppState>,
    Path((_username, count)): Path<(String, u32)>,
    Query(query): Query<StudentQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<TimetableData>>, SyncError> {
    let cookies = cookies_from_headers(&headers)?;
    let weeks = state
        .sync_service()
        .fetch_weeks_readonly(cookies, &query.student_id, ProfileSelection::Forward(count))
        .await?;
    Ok(Json(weeks))
}
