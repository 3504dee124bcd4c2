//! Cache trait for storing fetched payloads.
//!
//! The cache is fail-open by contract: a missing, stale, corrupt or unreadable
//! entry is simply absent, and writes that fail are logged and dropped. None of
//! the operations can surface an error to the caller.

use async_trait::async_trait;
use std::time::Duration;

/// A keyed payload store with optional read-time expiry.
///
/// Keys are sanitized by implementations to a filesystem-safe token. Entries
/// never self-expire at rest; staleness is judged against `max_age` at read
/// time, so the same entry can be current for one caller and stale for
/// another.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Retrieves a payload.
    ///
    /// Returns `None` if no entry exists, if the entry is older than
    /// `max_age`, or if it cannot be read back.
    async fn get(&self, key: &str, max_age: Option<Duration>) -> Option<Vec<u8>>;

    /// Stores a payload, overwriting any previous entry under the key.
    async fn set(&self, key: &str, payload: &[u8]);

    /// Removes one entry. Missing entries are not an error.
    async fn delete(&self, key: &str);

    /// Removes every entry. Best-effort.
    async fn clear(&self);
}

/// Sanitizes a cache key to a filesystem-safe token.
///
/// Alphanumerics, `-` and `_` are kept; everything else becomes `_`.
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
