//! Result model of a read-through lookup.

use std::fmt;

use crate::domain::entities::UserRecord;
use crate::domain::repositories::StoreError;

/// Tier that served a found record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Hot path: Redis.
    Cache,
    /// Cold path: PostgreSQL.
    Store,
}

impl Source {
    pub fn is_cache(self) -> bool {
        self == Source::Cache
    }
}

/// Failure that crosses the lookup boundary.
///
/// Cache problems never show up here; they are recovered by falling back to the
/// store. `Clone` lets a single failure be fanned out to every coalesced caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("repository find_by_id user_id={user_id}: {source}")]
    Store { user_id: String, source: StoreError },

    #[error("lookup deadline exceeded for user_id={user_id}")]
    DeadlineExceeded { user_id: String },
}

/// Outcome of a single lookup.
///
/// An explicit variant per case, so "found but failed" cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found { user: UserRecord, source: Source },
    NotFound,
    Failed(LookupError),
}

impl LookupOutcome {
    /// True only when the record came from the cache tier.
    pub fn cache_hit(&self) -> bool {
        matches!(
            self,
            Self::Found {
                source: Source::Cache,
                ..
            }
        )
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Found { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LookupError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Flattens the outcome into `(record, cache_hit, found, error)`.
    pub fn into_parts(self) -> (Option<UserRecord>, bool, bool, Option<LookupError>) {
        match self {
            Self::Found { user, source } => (Some(user), source.is_cache(), true, None),
            Self::NotFound => (None, false, false, None),
            Self::Failed(e) => (None, false, false, Some(e)),
        }
    }
}

/// Key that scopes request coalescing to one user.
///
/// Uses the same `user:<id>` namespace as the Redis entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn for_user(user_id: &str) -> Self {
        Self(format!("user:{user_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
