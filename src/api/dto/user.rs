//! DTOs for the user lookup endpoint.

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::UserRecord;

/// API version reported in every envelope.
pub const API_VERSION: &str = "v1";

/// Compiled regex for user id validation.
static USER_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,20}$").unwrap());

/// Query string of `GET /v1/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserQuery {
    /// Missing parameter deserializes to an empty string and fails validation.
    #[serde(default)]
    #[validate(regex(path = "*USER_ID_REGEX"))]
    pub user_id: String,
}

/// Response envelope shared by every outcome of the lookup endpoint.
///
/// Record fields are omitted unless the user was found.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub code: u16,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deeplink: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_message: Option<String>,

    pub cache_hit: bool,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    /// RFC 3339 UTC timestamp with second precision.
    pub timestamp: String,
    pub version: &'static str,
}

impl Metadata {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            version: API_VERSION,
        }
    }
}

impl UserResponse {
    /// Envelope for a found user; `message` names the tier that served it.
    pub fn found(user: UserRecord, cache_hit: bool) -> Self {
        let message = if cache_hit { "ok:redis" } else { "ok:postgres" };
        Self {
            code: 200,
            message: message.to_string(),
            user_id: Some(user.user_id),
            deeplink: Some(user.deeplink),
            promo_message: Some(user.promo_message),
            cache_hit,
            metadata: Metadata::now(),
        }
    }

    /// Envelope without a record, used for every non-200 response.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            user_id: None,
            deeplink: None,
            promo_message: None,
            cache_hit: false,
            metadata: Metadata::now(),
        }
    }
}
