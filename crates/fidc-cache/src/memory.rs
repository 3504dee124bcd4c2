//! In-memory cache implementation.

use async_trait::async_trait;
use fidc_core::CacheStore;
use fidc_core::cache::sanitize_key;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct Entry {
    payload: Vec<u8>,
    written_at: Instant,
}

/// Simple in-memory cache for testing and development.
///
/// Entries live in a `RwLock`-protected map and are lost when the cache is
/// dropped. Staleness is judged at read time, mirroring [`DiskCache`]
/// semantics.
///
/// [`DiskCache`]: crate::DiskCache
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache").finish_non_exhaustive()
    }
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str, max_age: Option<Duration>) -> Option<Vec<u8>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&sanitize_key(key))?;
        if let Some(max_age) = max_age
            && entry.written_at.elapsed() > max_age
        {
            debug!(key, "Cache entry expired");
            return None;
        }
        Some(entry.payload.clone())
    }

    async fn set(&self, key: &str, payload: &[u8]) {
        let mut entries = self.entries.write().await;
        entries.insert(
            sanitize_key(key),
            Entry {
                payload: payload.to_vec(),
                written_at: Instant::now(),
            },
        );
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(&sanitize_key(key));
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_and_delete() {
        let cache = InMemoryCache::new();
        assert!(cache.get("k", None).await.is_none());

        cache.set("k", b"v").await;
        assert_eq!(cache.get("k", None).await.as_deref(), Some(&b"v"[..]));

        cache.delete("k").await;
        assert!(cache.get("k", None).await.is_none());
    }

    #[tokio::test]
    async fn max_age_expires_entries() {
        let cache = InMemoryCache::new();
        cache.set("k", b"v").await;
        assert!(cache.get("k", Some(Duration::from_secs(60))).await.is_some());
        assert!(cache.get("k", Some(Duration::ZERO)).await.is_none());
    }
}
