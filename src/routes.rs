//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET /healthz`          - Liveness probe, empty body
//! - `GET /health`           - Component report: DB, cache, cache writer
//! - `GET /v1/users`         - Read-through user lookup
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Timeout** - Upper bound for producing a response
//! - **Path normalization** - Trailing slash handling

use std::time::Duration;

use crate::api;
use crate::api::handlers::{health_handler, liveness_handler};
use crate::api::middleware::{timeout, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `write_timeout` - requests still running after this long are answered
///   with `408 Request Timeout` in the standard envelope
pub fn app_router(state: AppState, write_timeout: Duration) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/healthz", get(liveness_handler))
        .route("/health", get(health_handler))
        .nest("/v1", api::routes::v1_routes())
        .with_state(state)
        .layer(timeout::layer(write_timeout))
        .layer(middleware::map_response(timeout::render_timeout))
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
