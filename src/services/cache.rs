use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Entries kept before the oldest one is evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
    expires_at: Instant,
}

/// A value returned by [`RequestCache::get_or_fetch`] and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOutcome<T> {
    pub value: T,
    pub hit: bool,
}

/// Short-lived memoization of fetch results, keyed by request.
///
/// Access is exclusive (`&mut self`): a check and the following write can
/// never interleave with another caller. Shared owners wrap the cache in a
/// `tokio::sync::Mutex`. Expired entries are swept on every read and write,
/// and the map never grows past `max_entries`.
pub struct RequestCache {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
    generation: u64,
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            generation: 0,
        }
    }

    /// Return the cached value for `key` if it is younger than `ttl`,
    /// otherwise run `fetch`, store its result and return it. Errors from
    /// `fetch` are passed through and not cached.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &mut self,
        key: &str,
        fetch: F,
        ttl: Duration,
    ) -> Result<CacheOutcome<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key, ttl) {
            return Ok(CacheOutcome { value, hit: true });
        }

        let value = fetch().await?;
        self.set(key, &value, ttl);
        Ok(CacheOutcome { value, hit: false })
    }

    pub fn get<T: DeserializeOwned>(&mut self, key: &str, ttl: Duration) -> Option<T> {
        self.sweep();

        let fresh = match self.entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() < ttl,
            None => {
                tracing::debug!("Cache miss for key: {}", key);
                return None;
            }
        };

        if !fresh {
            tracing::debug!("Cache entry expired for key: {}", key);
            self.entries.remove(key);
            return None;
        }

        let entry = self.entries.get(key)?;
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                tracing::debug!("Cache hit for key: {}", key);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Cached value for {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to cache {}: {}", key, e);
                return;
            }
        };

        self.sweep();
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone())
            {
                tracing::debug!("Cache full, evicting key: {}", oldest);
                self.entries.remove(&oldest);
            }
        }

        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: now,
                expires_at: now + ttl,
            },
        );
        tracing::debug!("Cached key: {}", key);
    }

    /// Drop one entry, or every entry when `key` is `None`.
    pub fn invalidate(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.entries.remove(key);
            }
            None => self.entries.clear(),
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Bumped by every [`invalidate`](Self::invalidate). A value fetched
    /// while the generation changed may predate the invalidation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}
