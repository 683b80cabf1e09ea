//! Read-through user lookup service.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::cache_writer::CacheWriter;
use crate::application::inflight::{InflightGate, Role};
use crate::domain::lookup::{DedupKey, LookupError, LookupOutcome, Source};
use crate::domain::repositories::UserRepository;
use crate::infrastructure::cache::CacheService;

/// Service resolving user records through Redis with PostgreSQL as the source of truth.
///
/// # Lookup Flow
///
/// 1. Bound the request by the caller's deadline and the configured budget
/// 2. Try the cache; a hit returns without touching the database
/// 3. On miss or cache error, join the in-flight query for the same user
///    (or start it), so concurrent misses cost one database round trip
/// 4. A record loaded from the database is queued for cache repopulation
///
/// Cache failures are logged and never reach the caller. Database failures are
/// returned as [`LookupOutcome::Failed`] with the offending `user_id`.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheService>,
    writer: CacheWriter,
    gate: Arc<InflightGate>,
    request_timeout: Duration,
}

impl UserService {
    /// Creates a new user service.
    ///
    /// A zero `request_timeout` imposes no deadline beyond the caller's own.
    pub fn new(
        repository: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheService>,
        writer: CacheWriter,
        gate: Arc<InflightGate>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            writer,
            gate,
            request_timeout,
        }
    }

    /// Looks up a user with the configured request budget only.
    pub async fn get_user(&self, user_id: &str) -> LookupOutcome {
        self.lookup(user_id, None).await
    }

    /// Looks up a user, finishing no later than `caller_deadline` if one is given.
    pub async fn lookup(&self, user_id: &str, caller_deadline: Option<Instant>) -> LookupOutcome {
        let deadline = self.request_deadline(caller_deadline);

        match within(deadline, self.cache.get_user(user_id)).await {
            Some(Ok(Some(user))) => {
                counter!("user_lookup_cache_hits_total").increment(1);
                return LookupOutcome::Found {
                    user,
                    source: Source::Cache,
                };
            }
            Some(Ok(None)) => {
                counter!("user_lookup_cache_misses_total").increment(1);
            }
            Some(Err(e)) => {
                counter!("user_lookup_cache_errors_total").increment(1);
                warn!(user_id, error = %e, "cache_get_error");
            }
            None => {
                counter!("user_lookup_cache_errors_total").increment(1);
                warn!(user_id, "cache_get_timeout");
            }
        }

        if deadline.is_some_and(|d| d <= Instant::now()) {
            return deadline_exceeded(user_id);
        }

        let (shared, role) = self.gate.join(DedupKey::for_user(user_id), || {
            load_from_store(
                Arc::clone(&self.repository),
                self.writer.clone(),
                user_id.to_owned(),
                deadline,
            )
        });
        if role == Role::Waiter {
            counter!("user_lookup_coalesced_total").increment(1);
            debug!(user_id, "joined in-flight store lookup");
        }

        within(deadline, shared)
            .await
            .unwrap_or_else(|| deadline_exceeded(user_id))
    }

    /// Intersects the caller's deadline with the configured budget.
    fn request_deadline(&self, caller_deadline: Option<Instant>) -> Option<Instant> {
        let budget = (!self.request_timeout.is_zero()).then(|| Instant::now() + self.request_timeout);
        match (caller_deadline, budget) {
            (Some(caller), Some(budget)) => Some(caller.min(budget)),
            (caller, budget) => caller.or(budget),
        }
    }
}

/// Cold path, executed once per miss episode by the episode's owner.
async fn load_from_store(
    repository: Arc<dyn UserRepository>,
    writer: CacheWriter,
    user_id: String,
    deadline: Option<Instant>,
) -> LookupOutcome {
    counter!("user_lookup_store_queries_total").increment(1);

    match within(deadline, repository.find_by_id(&user_id)).await {
        None => LookupOutcome::Failed(LookupError::DeadlineExceeded { user_id }),
        Some(Err(source)) => LookupOutcome::Failed(LookupError::Store { user_id, source }),
        Some(Ok(None)) => LookupOutcome::NotFound,
        Some(Ok(Some(user))) => {
            writer.submit(user.clone());
            LookupOutcome::Found {
                user,
                source: Source::Store,
            }
        }
    }
}

/// Awaits `future`, giving up at `deadline` if there is one.
async fn within<F: Future>(deadline: Option<Instant>, future: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}

fn deadline_exceeded(user_id: &str) -> LookupOutcome {
    LookupOutcome::Failed(LookupError::DeadlineExceeded {
        user_id: user_id.to_owned(),
    })
}
