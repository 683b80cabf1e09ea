//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::entities::UserRecord;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info};

/// Pause between retries of a failed Redis command.
const RETRY_DELAY_MS: u64 = 10;

/// Expiry in whole seconds for `SETEX`, or `None` to `SET` without expiry.
///
/// Sub-second TTLs round up to one second; Redis rejects `SETEX` with zero.
fn expiry_seconds(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        return None;
    }
    let seconds = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    Some(seconds.max(1))
}

/// Per-command limits applied on top of the multiplexed connection.
#[derive(Debug, Clone, Copy)]
pub struct RedisCacheOptions {
    /// Upper bound for a single GET or PING.
    pub read_timeout: Duration,
    /// Upper bound for a single SET.
    pub write_timeout: Duration,
    /// Additional attempts after the first failed one.
    pub max_retries: usize,
}

impl Default for RedisCacheOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            write_timeout: Duration::from_millis(100),
            max_retries: 1,
        }
    }
}

/// Redis cache implementation for fast user lookups.
///
/// Uses `ConnectionManager` for a shared, auto-reconnecting multiplexed
/// connection. Entries are stored as JSON under `user:<user_id>`.
pub struct RedisCache {
    client: ConnectionManager,
    key_prefix: String,
    options: RedisCacheOptions,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379/0"`)
    /// - `options` - per-command timeouts and retry budget
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, options: RedisCacheOptions) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            key_prefix: "user:".to_string(),
            options,
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }

    /// Runs one Redis command under `timeout`, retrying up to `max_retries` times.
    async fn run<T, F, Fut>(&self, op: &'static str, timeout: Duration, mut command: F) -> CacheResult<T>
    where
        F: FnMut(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let strategy = FixedInterval::from_millis(RETRY_DELAY_MS).take(self.options.max_retries);

        Retry::spawn(strategy, || {
            let pending = command(self.client.clone());
            async move {
                match tokio::time::timeout(timeout, pending).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(CacheError::OperationError(format!("{op}: {e}"))),
                    Err(_) => Err(CacheError::Timeout(timeout)),
                }
            }
        })
        .await
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_user(&self, user_id: &str) -> CacheResult<Option<UserRecord>> {
        let key = self.build_key(user_id);

        let payload = self
            .run("GET", self.options.read_timeout, |mut conn| {
                let key = key.clone();
                async move { conn.get::<_, Option<String>>(&key).await }
            })
            .await?;

        match payload {
            Some(json) => {
                let user = serde_json::from_str::<UserRecord>(&json).map_err(|e| {
                    CacheError::OperationError(format!("undecodable entry {}: {}", key, e))
                })?;
                debug!("Cache HIT: {}", key);
                Ok(Some(user))
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    async fn set_user(&self, user: &UserRecord, ttl: Duration) -> CacheResult<()> {
        let key = self.build_key(&user.user_id);
        let payload = serde_json::to_string(user)
            .map_err(|e| CacheError::OperationError(format!("encode {}: {}", key, e)))?;

        match expiry_seconds(ttl) {
            None => {
                self.run("SET", self.options.write_timeout, |mut conn| {
                    let (key, payload) = (key.clone(), payload.clone());
                    async move { conn.set::<_, _, ()>(&key, payload).await }
                })
                .await?;
            }
            Some(seconds) => {
                self.run("SETEX", self.options.write_timeout, |mut conn| {
                    let (key, payload) = (key.clone(), payload.clone());
                    async move { conn.set_ex::<_, _, ()>(&key, payload, seconds).await }
                })
                .await?;
            }
        }

        debug!("Cache SET: {} (TTL: {}s)", key, ttl.as_secs());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.run("PING", self.options.read_timeout, |mut conn| async move {
            conn.ping::<()>().await
        })
        .await
        .is_ok()
    }
}
