#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use user_lookup::application::cache_writer::CacheWriter;
use user_lookup::application::inflight::InflightGate;
use user_lookup::application::services::UserService;
use user_lookup::domain::entities::UserRecord;
use user_lookup::domain::repositories::{StoreError, UserRepository};
use user_lookup::infrastructure::cache::{CacheError, CacheResult, CacheService};
use user_lookup::state::AppState;

pub const TEST_TTL: Duration = Duration::from_secs(3600);

/// In-memory user table that counts queries.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, UserRecord>>,
    queries: AtomicUsize,
    latency: Mutex<Duration>,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().extend(
            users
                .into_iter()
                .map(|user| (user.user_id.clone(), user)),
        );
        store
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }

        Ok(self.records.lock().unwrap().get(user_id).cloned())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

/// In-memory cache that records the TTL of every write.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (UserRecord, Duration)>>,
    sets: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryCache {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn insert(&self, user: UserRecord) {
        self.entries
            .lock()
            .unwrap()
            .insert(user.user_id.clone(), (user, TEST_TTL));
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.entries.lock().unwrap().contains_key(user_id)
    }

    pub fn ttl_of(&self, user_id: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(user_id).map(|(_, ttl)| *ttl)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get_user(&self, user_id: &str) -> CacheResult<Option<UserRecord>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError("connection reset".to_string()));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(user_id)
            .map(|(user, _)| user.clone()))
    }

    async fn set_user(&self, user: &UserRecord, ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError("connection reset".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(user.user_id.clone(), (user.clone(), ttl));
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

/// Service wired to fakes, plus the handles tests inspect.
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<InMemoryCache>,
    pub gate: Arc<InflightGate>,
    pub writer: CacheWriter,
    pub writer_handle: JoinHandle<()>,
    pub service: Arc<UserService>,
}

impl TestContext {
    pub fn new(store: InMemoryStore, request_timeout: Duration) -> Self {
        let store = Arc::new(store);
        let cache = Arc::new(InMemoryCache::default());
        let gate = Arc::new(InflightGate::new());

        let (writer, writer_handle) = CacheWriter::spawn(cache.clone(), TEST_TTL, 64, 4);
        let service = Arc::new(UserService::new(
            store.clone(),
            cache.clone(),
            writer.clone(),
            gate.clone(),
            request_timeout,
        ));

        Self {
            store,
            cache,
            gate,
            writer,
            writer_handle,
            service,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.service.clone(),
            self.store.clone(),
            self.cache.clone(),
            self.writer.clone(),
        )
    }

    /// Drops every writer handle and waits until queued writes are applied.
    pub async fn drain_writer(self) -> (Arc<InMemoryStore>, Arc<InMemoryCache>) {
        let Self {
            store,
            cache,
            writer,
            writer_handle,
            service,
            ..
        } = self;
        drop(service);
        drop(writer);
        writer_handle.await.unwrap();
        (store, cache)
    }
}

pub fn abc123() -> UserRecord {
    UserRecord::new("abc123", "app://promo/42", "Welcome back")
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
