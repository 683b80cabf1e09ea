//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, the cache writer, and the Axum
//! server lifecycle.

use crate::application::cache_writer::CacheWriter;
use crate::application::inflight::InflightGate;
use crate::application::services::UserService;
use crate::config::Config;
use crate::domain::repositories::UserRepository;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache, RedisCacheOptions};
use crate::infrastructure::persistence::PgUserRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// How long pending cache writes may take to drain after the server stops.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - Background cache writer
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let cache = connect_cache(&config).await;

    let (cache_writer, writer_handle) = CacheWriter::spawn(
        Arc::clone(&cache),
        config.cache_ttl(),
        config.cache_write_queue_capacity,
        config.cache_write_concurrency,
    );
    tracing::info!("Cache writer started");

    let repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(Arc::new(pool)));
    let user_service = Arc::new(UserService::new(
        Arc::clone(&repository),
        Arc::clone(&cache),
        cache_writer.clone(),
        Arc::new(InflightGate::new()),
        config.request_timeout(),
    ));

    let state = AppState::new(user_service, repository, cache, cache_writer);
    let app = app_router(state, config.http_write_timeout());

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router, and with it every writer handle, is gone once serve returns.
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_handle).await {
        Ok(Ok(())) => tracing::info!("Cache writer drained"),
        Ok(Err(e)) => tracing::warn!("Cache writer task failed: {}", e),
        Err(_) => tracing::warn!("Cache writer did not drain in time, abandoning pending writes"),
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the initial connection cannot be established.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let max_lifetime = (config.pg_max_conn_lifetime_sec > 0)
        .then(|| Duration::from_secs(config.pg_max_conn_lifetime_sec));

    PgPoolOptions::new()
        .max_connections(config.pg_max_conns)
        .acquire_timeout(Duration::from_secs(config.pg_acquire_timeout_sec))
        .idle_timeout(Duration::from_secs(config.pg_max_conn_idle_time_sec))
        .max_lifetime(max_lifetime)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Connects to Redis, falling back to [`NullCache`] when it is not configured
/// or unreachable.
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, redis_options(config)).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Per-command Redis limits taken from the configuration.
pub fn redis_options(config: &Config) -> RedisCacheOptions {
    RedisCacheOptions {
        read_timeout: Duration::from_millis(config.redis_read_timeout_ms),
        write_timeout: Duration::from_millis(config.redis_write_timeout_ms),
        max_retries: config.redis_max_retries,
    }
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
