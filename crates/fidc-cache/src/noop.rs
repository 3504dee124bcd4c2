//! No-op cache implementation.

use async_trait::async_trait;
use fidc_core::CacheStore;
use std::time::Duration;

/// A cache that stores nothing: every read misses, every write is dropped.
///
/// Useful for forcing fresh network calls in a pipeline run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl NoopCache {
    /// Creates a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for NoopCache {
    async fn get(&self, _key: &str, _max_age: Option<Duration>) -> Option<Vec<u8>> {
        None
    }

    async fn set(&self, _key: &str, _payload: &[u8]) {}

    async fn delete(&self, _key: &str) {}

    async fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_stores() {
        let cache = NoopCache::new();
        cache.set("k", b"v").await;
        assert!(cache.get("k", None).await.is_none());
    }
}
