//! Disk-backed cache implementation.

use async_trait::async_trait;
use fidc_core::CacheStore;
use fidc_core::cache::sanitize_key;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Flat-directory cache: one file per key, entry age judged from the file's
/// modification time at read time.
///
/// Every operation is fail-open. A directory that cannot be created, an entry
/// that cannot be read, or a write that fails degrade to cache misses and
/// dropped writes with a warning; no error ever reaches the caller.
#[derive(Debug)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`, creating the directory if needed.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Could not create cache directory");
        }
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", sanitize_key(key)))
    }

    fn entry_age(path: &Path) -> Option<Duration> {
        let modified = std::fs::metadata(path).ok()?.modified().ok()?;
        SystemTime::now().duration_since(modified).ok()
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn get(&self, key: &str, max_age: Option<Duration>) -> Option<Vec<u8>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return None;
        }

        if let Some(max_age) = max_age {
            let age = Self::entry_age(&path)?;
            if age > max_age {
                debug!(key, age_secs = age.as_secs(), "Cache entry expired");
                return None;
            }
        }

        match std::fs::read(&path) {
            Ok(payload) => {
                debug!(key, bytes = payload.len(), "Cache hit");
                Some(payload)
            }
            Err(e) => {
                warn!(key, error = %e, "Could not read cache entry");
                None
            }
        }
    }

    async fn set(&self, key: &str, payload: &[u8]) {
        let path = self.entry_path(key);
        match std::fs::write(&path, payload) {
            Ok(()) => debug!(key, bytes = payload.len(), "Cache entry written"),
            Err(e) => warn!(key, error = %e, "Could not write cache entry"),
        }
    }

    async fn delete(&self, key: &str) {
        let path = self.entry_path(key);
        if path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            warn!(key, error = %e, "Could not delete cache entry");
        }
    }

    async fn clear(&self) {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Could not list cache directory");
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "bin")
                && let Err(e) = std::fs::remove_file(&path)
            {
                warn!(path = %path.display(), error = %e, "Could not remove cache entry");
            }
        }
        debug!(dir = %self.dir.display(), "Cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        assert!(cache.get("docs_123", None).await.is_none());

        cache.set("docs_123", b"payload").await;
        assert_eq!(cache.get("docs_123", None).await.as_deref(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn fresh_entry_honors_max_age_then_expires() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        cache.set("k", b"v").await;
        assert!(
            cache
                .get("k", Some(Duration::from_secs(1)))
                .await
                .is_some()
        );

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(cache.get("k", Some(Duration::from_secs(1))).await.is_none());
        // No max age: the entry is still served.
        assert!(cache.get("k", None).await.is_some());
    }

    #[tokio::test]
    async fn keys_are_sanitized_to_one_file_each() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        cache.set("xml/1?id=2", b"a").await;
        assert_eq!(cache.get("xml/1?id=2", None).await.as_deref(), Some(&b"a"[..]));
        // Same sanitized token, same entry.
        assert_eq!(cache.get("xml_1_id_2", None).await.as_deref(), Some(&b"a"[..]));
    }

    #[tokio::test]
    async fn delete_and_clear_are_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        // Deleting a missing key must not panic or error.
        cache.delete("missing").await;

        cache.set("a", b"1").await;
        cache.set("b", b"2").await;
        cache.delete("a").await;
        assert!(cache.get("a", None).await.is_none());
        assert!(cache.get("b", None).await.is_some());

        cache.clear().await;
        assert!(cache.get("b", None).await.is_none());
    }
}
