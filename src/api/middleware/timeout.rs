//! Request deadline middleware.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_http::timeout::TimeoutLayer;

use crate::error::AppError;

/// Aborts handlers still running after `write_timeout` with `408 Request Timeout`.
///
/// The bare response is rewritten into the JSON envelope by [`render_timeout`].
pub fn layer(write_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, write_timeout)
}

/// Gives a timed-out request the same envelope as every other response.
///
/// No handler answers 408 itself, so any 408 here comes from [`layer`].
pub async fn render_timeout(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return AppError::timeout("request timeout").into_response();
    }
    response
}
