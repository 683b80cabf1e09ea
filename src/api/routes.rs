//! API route configuration.

use crate::api::handlers::get_user_handler;
use crate::state::AppState;
use axum::{Router, routing::get};

/// Versioned lookup routes, nested under `/v1`.
///
/// # Endpoints
///
/// - `GET /users?user_id={id}` - Read-through user lookup
pub fn v1_routes() -> Router<AppState> {
    Router::new().route("/users", get(get_user_handler))
}
