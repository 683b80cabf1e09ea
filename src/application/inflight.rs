//! Per-key request coalescing for cold-path lookups.
//!
//! The gate maps a [`DedupKey`] to a weak handle on the store query currently
//! running for it. The first caller of a miss episode starts the query, every
//! caller that arrives before it resolves awaits the same shared future, and
//! the entry is cleared as soon as the query finishes or is abandoned by all
//! of its waiters.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use tracing::trace;

use crate::domain::lookup::{DedupKey, LookupOutcome};

/// Handle on an in-flight lookup, awaited by every coalesced caller.
pub type SharedLookup = Shared<BoxFuture<'static, LookupOutcome>>;

type Inflight = Arc<DashMap<DedupKey, Episode>>;

struct Episode {
    id: u64,
    handle: Option<WeakShared<BoxFuture<'static, LookupOutcome>>>,
}

/// Whether a caller started the episode or joined a running one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Waiter,
}

/// Concurrency-safe registry of in-flight store queries.
///
/// Create one per process and hand it to [`crate::application::services::UserService`].
#[derive(Default)]
pub struct InflightGate {
    inflight: Inflight,
    next_episode: AtomicU64,
}

impl InflightGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the episode running for `key`, or starts one with `work`.
    ///
    /// `work` is only invoked when this caller becomes the owner. The shard lock
    /// of the map is held just long enough to look up or register the entry.
    pub fn join<F, Fut>(&self, key: DedupKey, work: F) -> (SharedLookup, Role)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LookupOutcome> + Send + 'static,
    {
        match self.inflight.entry(key) {
            Entry::Occupied(mut entry) => {
                if let Some(shared) = entry.get().handle.as_ref().and_then(WeakShared::upgrade) {
                    trace!(key = %entry.key(), "joined in-flight lookup");
                    return (shared, Role::Waiter);
                }
                let (episode, shared) = self.start(entry.key().clone(), work);
                entry.insert(episode);
                (shared, Role::Owner)
            }
            Entry::Vacant(entry) => {
                let (episode, shared) = self.start(entry.key().clone(), work);
                entry.insert(episode);
                (shared, Role::Owner)
            }
        }
    }

    /// Number of keys with a registered episode.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    fn start<F, Fut>(&self, key: DedupKey, work: F) -> (Episode, SharedLookup)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LookupOutcome> + Send + 'static,
    {
        let id = self.next_episode.fetch_add(1, Ordering::Relaxed);
        let guard = EpisodeGuard {
            inflight: Arc::clone(&self.inflight),
            key,
            id,
        };
        let query = work();

        let shared = async move {
            let _guard = guard;
            query.await
        }
        .boxed()
        .shared();

        let episode = Episode {
            id,
            handle: shared.downgrade(),
        };
        (episode, shared)
    }
}

/// Clears the gate entry when its query completes or is dropped.
struct EpisodeGuard {
    inflight: Inflight,
    key: DedupKey,
    id: u64,
}

impl Drop for EpisodeGuard {
    fn drop(&mut self) {
        // A newer episode may already own the key.
        self.inflight
            .remove_if(&self.key, |_, episode| episode.id == self.id);
    }
}
