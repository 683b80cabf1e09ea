//! Cache service trait and error types.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::domain::entities::UserRecord;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
    Timeout(Duration),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
            Self::Timeout(d) => write!(f, "Cache operation timed out after {}ms", d.as_millis()),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for caching user records.
///
/// Implementations must be thread-safe. Unlike a fail-open cache, they report
/// transport errors to the caller so that a degraded cache can be told apart
/// from a clean miss; the caller decides to fall back to the database.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves a cached user record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(user))` on cache hit
    /// - `Ok(None)` on a clean cache miss
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend is unreachable, too slow, or
    /// holds an entry that cannot be decoded.
    async fn get_user(&self, user_id: &str) -> CacheResult<Option<UserRecord>>;

    /// Stores a user record keyed by its `user_id`.
    ///
    /// A zero `ttl` stores the entry without expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on backend failures. Callers treat writes as
    /// best-effort and only log these.
    async fn set_user(&self, user: &UserRecord, ttl: Duration) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by health check endpoints to report cache status.
    async fn health_check(&self) -> bool;
}
