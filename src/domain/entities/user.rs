//! User record served by the lookup endpoint.

use serde::{Deserialize, Serialize};

/// The minimal user record stored in PostgreSQL and mirrored in Redis.
///
/// The same JSON shape is used for the cache entry, so a record written by one
/// instance of the service can be read back by any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: String,
    pub deeplink: String,
    pub promo_message: String,
}

impl UserRecord {
    /// Creates a new UserRecord instance.
    pub fn new(
        user_id: impl Into<String>,
        deeplink: impl Into<String>,
        promo_message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            deeplink: deeplink.into(),
            promo_message: promo_message.into(),
        }
    }
}
