//! In-memory query result cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::types::ApiResponse;

use super::tags::Tag;

/// How long a cached result stays usable by default.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    response: ApiResponse,
    tags: Vec<Tag>,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Bumped by every invalidation and clear.
    epoch: u64,
    /// Epoch of the latest invalidation touching each resource kind.
    invalidated: HashMap<String, u64>,
    /// Epoch of the latest clear.
    cleared: u64,
}

impl CacheState {
    /// Whether a result for `tags` fetched at `since` was overtaken by an
    /// invalidation or clear.
    fn overtaken(&self, tags: &[Tag], since: u64) -> bool {
        self.cleared > since
            || tags
                .iter()
                .any(|tag| self.invalidated.get(tag.kind()).is_some_and(|&at| at > since))
    }
}

/// Cached query results keyed by endpoint and arguments.
///
/// A fetch that was in flight while its tags were invalidated must not land
/// in the cache: callers take [`epoch`](Self::epoch) before fetching and store
/// through [`insert_since`](Self::insert_since).
#[derive(Debug)]
pub struct QueryCache {
    state: Mutex<CacheState>,
    max_age: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    /// Create an empty cache with [`DEFAULT_MAX_AGE`].
    pub fn new() -> Self {
        Self::with_max_age(DEFAULT_MAX_AGE)
    }

    /// Create an empty cache whose entries expire after `max_age`.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_age,
        }
    }

    /// Returns a fresh cached response, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<ApiResponse> {
        let mut state = self.lock();
        let entry = state.entries.get(key)?;

        if self.is_stale(entry) {
            trace!(key, "Evicting expired cache entry");
            state.entries.remove(key);
            return None;
        }

        Some(entry.response.clone())
    }

    /// The current invalidation epoch. Take it before fetching a result that
    /// will be stored with [`insert_since`](Self::insert_since).
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Store a response together with the tags it provides.
    pub fn insert(&self, key: impl Into<String>, response: ApiResponse, tags: Vec<Tag>) {
        self.lock().entries.insert(
            key.into(),
            CacheEntry {
                response,
                tags,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Store a response fetched after `since` was read from
    /// [`epoch`](Self::epoch), unless one of its tag kinds was invalidated (or
    /// the cache cleared) in the meantime.
    ///
    /// Returns false if the response was discarded.
    pub fn insert_since(
        &self,
        key: impl Into<String>,
        response: ApiResponse,
        tags: Vec<Tag>,
        since: u64,
    ) -> bool {
        let mut state = self.lock();
        if state.overtaken(&tags, since) {
            return false;
        }

        state.entries.insert(
            key.into(),
            CacheEntry {
                response,
                tags,
                fetched_at: Utc::now(),
            },
        );
        true
    }

    /// Evict every entry providing a tag matched by `tags`.
    ///
    /// Returns the number of entries evicted.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        if tags.is_empty() {
            return 0;
        }

        let mut state = self.lock();
        state.epoch += 1;
        let epoch = state.epoch;
        for tag in tags {
            state.invalidated.insert(tag.kind().to_string(), epoch);
        }

        let before = state.entries.len();
        state.entries.retain(|_, entry| {
            !entry
                .tags
                .iter()
                .any(|provided| tags.iter().any(|tag| tag.invalidates(provided)))
        });
        before - state.entries.len()
    }

    /// Drop everything, including results still being fetched.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.epoch += 1;
        state.cleared = state.epoch;
    }

    /// Number of entries, fresh or not.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_stale(&self, entry: &CacheEntry) -> bool {
        // Clock going backwards counts as fresh.
        (Utc::now() - entry.fetched_at)
            .to_std()
            .is_ok_and(|age| age >= self.max_age)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
