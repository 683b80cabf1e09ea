//! CLI administration tool for user-lookup.
//!
//! Runs lookups and connectivity checks against the same PostgreSQL and Redis
//! the service uses, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a user through the read-through path
//! cargo run --bin admin -- lookup abc123
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Ping Redis
//! cargo run --bin admin -- cache ping
//! ```
//!
//! # Environment Variables
//!
//! The same variables as the server, see `user_lookup::config`.

use user_lookup::application::cache_writer::CacheWriter;
use user_lookup::application::inflight::InflightGate;
use user_lookup::application::services::UserService;
use user_lookup::config::{self, Config};
use user_lookup::domain::lookup::LookupOutcome;
use user_lookup::domain::repositories::UserRepository;
use user_lookup::infrastructure::cache::{CacheService, RedisCache};
use user_lookup::infrastructure::persistence::PgUserRepository;
use user_lookup::server::{connect_cache, connect_pool, redis_options};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;

/// CLI tool for user-lookup.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Resolve a user through cache and database
    Lookup {
        /// User identifier (1-20 of `A-Z a-z 0-9 _ -`)
        user_id: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Cache operations
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

/// Cache operation subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Ping the configured Redis
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Lookup { user_id } => handle_lookup(&config, &user_id).await?,
        Commands::Db { action } => handle_db_action(&config, action).await?,
        Commands::Cache { action } => handle_cache_action(&config, action).await?,
    }

    Ok(())
}

/// Runs one lookup with the server's wiring and prints the outcome.
///
/// The cache write for a database hit is awaited before exiting.
async fn handle_lookup(config: &Config, user_id: &str) -> Result<()> {
    println!("{} {}", "🔎 Looking up".bright_blue(), user_id.bright_white());
    println!();

    let pool = connect_pool(config).await?;
    let cache = connect_cache(config).await;
    let (writer, writer_handle) = CacheWriter::spawn(
        Arc::clone(&cache),
        config.cache_ttl(),
        config.cache_write_queue_capacity,
        config.cache_write_concurrency,
    );

    let repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(Arc::new(pool)));
    let service = UserService::new(
        repository,
        cache,
        writer,
        Arc::new(InflightGate::new()),
        config.request_timeout(),
    );

    let outcome = service.lookup(user_id, None).await;
    drop(service);
    writer_handle.await.context("Cache writer task failed")?;

    match outcome {
        LookupOutcome::Found { user, source } => {
            let served_by = if source.is_cache() { "redis" } else { "postgres" };
            println!("  Deeplink:      {}", user.deeplink.bright_green().bold());
            println!("  Promo message: {}", user.promo_message.bright_green());
            println!("  Served by:     {}", served_by.bright_white());
        }
        LookupOutcome::NotFound => {
            println!("{}", "❌ User not found".yellow().bold());
        }
        LookupOutcome::Failed(e) => {
            println!("{}", "❌ Lookup failed".red().bold());
            anyhow::bail!(e);
        }
    }
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(config: &Config, action: DbAction) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = connect_pool(config).await?;
            let repository = PgUserRepository::new(Arc::new(pool));
            repository
                .health_check()
                .await
                .context("Database health check failed")?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
    }

    Ok(())
}

/// Handles cache diagnostic commands.
async fn handle_cache_action(config: &Config, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Ping => {
            let Some(redis_url) = &config.redis_url else {
                println!("{}", "⚠️  Redis is not configured".yellow());
                return Ok(());
            };

            println!("{}", "🔍 Pinging Redis...".bright_blue());

            let redis = RedisCache::connect(redis_url, redis_options(config))
                .await
                .context("Failed to connect to Redis")?;

            if redis.health_check().await {
                println!("{}", "✅ Redis connection OK".green().bold());
            } else {
                anyhow::bail!("Redis did not answer PING");
            }
        }
    }

    Ok(())
}
