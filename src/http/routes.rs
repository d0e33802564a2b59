//! Axum router configuration

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{fetch_subtitles, health_check, preflight, version_check};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.cors_enabled;

    let router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Subtitle endpoint, singular path kept as an alias
        .route(
            "/api/subtitles",
            get(fetch_subtitles).post(fetch_subtitles).options(preflight),
        )
        .route(
            "/api/subtitle",
            get(fetch_subtitles).post(fetch_subtitles).options(preflight),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if !cors_enabled {
        return router;
    }

    // Same three headers on every response, preflight or not.
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}
