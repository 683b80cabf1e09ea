//! Handler for user lookups.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use std::time::Instant;
use tracing::{error, info};
use validator::Validate;

use crate::api::dto::user::{UserQuery, UserResponse};
use crate::domain::lookup::LookupOutcome;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the deeplink and promo message of a user.
///
/// # Endpoint
///
/// `GET /v1/users?user_id={id}`
///
/// # Request Flow
///
/// 1. Validate `user_id` against `^[A-Za-z0-9_-]{1,20}$`
/// 2. Resolve through [`crate::application::services::UserService`]
///    (Redis first, PostgreSQL on miss)
/// 3. Report which tier served the record in `message` and `cache_hit`
///
/// # Response
///
/// ```json
/// {
///   "code": 200,
///   "message": "ok:redis",
///   "user_id": "abc123",
///   "deeplink": "app://promo/42",
///   "promo_message": "Welcome back",
///   "cache_hit": true,
///   "metadata": { "timestamp": "2024-06-01T12:00:00Z", "version": "v1" }
/// }
/// ```
///
/// # Errors
///
/// - **400 Bad Request**: `user_id` missing or malformed
/// - **404 Not Found**: no such user
/// - **500 Internal Server Error**: database failure or lookup deadline exceeded
pub async fn get_user_handler(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let start = Instant::now();

    let Query(query) = query.map_err(|_| AppError::bad_request("invalid user_id"))?;
    query.validate()?;

    match state.user_service.get_user(&query.user_id).await {
        LookupOutcome::Found { user, source } => {
            let response = UserResponse::found(user, source.is_cache());
            info!(
                user_id = %query.user_id,
                cache_hit = response.cache_hit,
                code = response.code,
                latency_ms = start.elapsed().as_millis() as u64,
                "get_user"
            );
            Ok(Json(response))
        }
        LookupOutcome::NotFound => Err(AppError::not_found("not found")),
        LookupOutcome::Failed(e) => {
            error!(user_id = %query.user_id, error = %e, "get_user_error");
            Err(e.into())
        }
    }
}
