//! Router construction.

use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::web::{profiles, status, sync};

/// Whole-request budget; multi-week fetches against a slow upstream can
/// legitimately take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(status::health))
        .route("/sync/initial", post(sync::initial_sync))
        .route("/sync", post(sync::sync))
        .route("/session/refresh", post(sync::refresh_session))
        .route("/profiles/{username}/weeks/all", get(profiles::all_weeks))
        .route(
            "/profiles/{username}/weeks/current_forward",
            get(profiles::current_forward_weeks),
        )
        .route(
            "/profiles/{username}/weeks/forward/{count}",
            get(profiles::forward_weeks),
        )
        .route(
            "/profiles/{username}/weeks/{offset}",
            get(profiles::week_by_offset),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
