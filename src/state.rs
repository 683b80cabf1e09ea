//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::cache_writer::CacheWriter;
use crate::application::services::UserService;
use crate::domain::repositories::UserRepository;
use crate::infrastructure::cache::CacheService;

/// Application state cloned into each request.
///
/// The lookup handler only needs [`UserService`]; the remaining handles back
/// the component checks of `GET /health`.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub repository: Arc<dyn UserRepository>,
    pub cache: Arc<dyn CacheService>,
    pub cache_writer: CacheWriter,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        repository: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheService>,
        cache_writer: CacheWriter,
    ) -> Self {
        Self {
            user_service,
            repository,
            cache,
            cache_writer,
        }
    }
}
