//! Background cache repopulation.
//!
//! Cold-path lookups hand the record they loaded to a [`CacheWriter`]; a single
//! worker task drains the queue and writes entries with bounded concurrency.
//! Writes run outside of any request, so a request that times out or is
//! cancelled never aborts warming the cache for the callers after it.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::domain::entities::UserRecord;
use crate::infrastructure::cache::CacheService;

/// Submission side of the cache repopulation queue.
///
/// Cheap to clone; the worker exits once every clone is dropped and the
/// queue is drained.
#[derive(Clone)]
pub struct CacheWriter {
    sender: mpsc::Sender<UserRecord>,
}

impl CacheWriter {
    /// Starts the worker and returns the writer plus the worker's join handle.
    ///
    /// # Arguments
    ///
    /// - `cache` - cache to write into
    /// - `ttl` - expiry of written entries (zero = no expiry)
    /// - `capacity` - queued writes before new ones are dropped
    /// - `concurrency` - writes in flight at once
    pub fn spawn(
        cache: Arc<dyn CacheService>,
        ttl: Duration,
        capacity: usize,
        concurrency: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_cache_writer(receiver, cache, ttl, concurrency.max(1)));
        (Self { sender }, worker)
    }

    /// Queues a best-effort write. Returns `false` if the write was dropped.
    pub fn submit(&self, user: UserRecord) -> bool {
        match self.sender.try_send(user) {
            Ok(()) => true,
            Err(TrySendError::Full(user)) => {
                counter!("cache_writer_dropped_total").increment(1);
                warn!(user_id = %user.user_id, "cache write queue full, dropping write");
                false
            }
            Err(TrySendError::Closed(user)) => {
                counter!("cache_writer_dropped_total").increment(1);
                warn!(user_id = %user.user_id, "cache write queue closed, dropping write");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots left in the queue.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

/// Drains queued writes, keeping at most `concurrency` of them in flight.
async fn run_cache_writer(
    mut receiver: mpsc::Receiver<UserRecord>,
    cache: Arc<dyn CacheService>,
    ttl: Duration,
    concurrency: usize,
) {
    let mut writes = JoinSet::new();

    while let Some(user) = receiver.recv().await {
        if writes.len() >= concurrency {
            writes.join_next().await;
        }

        let cache = Arc::clone(&cache);
        writes.spawn(async move {
            match cache.set_user(&user, ttl).await {
                Ok(()) => debug!(user_id = %user.user_id, "cache repopulated"),
                Err(e) => warn!(user_id = %user.user_id, error = %e, "cache_set_error"),
            }
        });
    }

    while writes.join_next().await.is_some() {}
    debug!("cache writer stopped");
}
