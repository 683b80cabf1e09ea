//! Repository trait for authoritative user lookups.

use crate::domain::entities::UserRecord;
use async_trait::async_trait;

/// Failure reported by the durable store.
///
/// Carries the rendered driver message rather than the driver error itself so
/// one failure can be handed to every caller coalesced onto the same query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The pool could not hand out a connection or the connection broke.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// The query itself failed.
    #[error("database query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Unavailable(e.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

/// Repository interface for reading user records.
///
/// The store is authoritative: `Ok(None)` means the user does not exist, and an
/// error is never downgraded to a miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_user.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by primary key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UserRecord))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity or query failures.
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Round-trips a trivial query to verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be reached.
    async fn health_check(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_map_to_unavailable() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_row_errors_map_to_query() {
        let err = StoreError::from(sqlx::Error::ColumnNotFound("deeplink".to_string()));
        assert!(matches!(err, StoreError::Query(_)));
        assert!(err.to_string().contains("deeplink"));
    }
}
