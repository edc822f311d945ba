//! Named Cache Storage Abstraction
//!
//! Provides a platform-agnostic trait for the named-cache facility: a set of
//! independently addressable stores of request-identity → response-snapshot
//! pairs. The core layers caching *policy* on top of this primitive; the
//! primitive itself is assumed correct.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

use crate::error::Result;
use crate::http::HttpResponse;

/// An immutable snapshot of a response, as stored in a named cache.
///
/// Snapshots are value types; storing one and returning one to a caller are
/// independent copies, so a stored body can never be consumed out from under
/// a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    /// Unix timestamp (seconds) at which the snapshot was stored.
    pub stored_at: i64,
}

impl ResponseSnapshot {
    /// Snapshot a live response for storage.
    pub fn of(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Build a snapshot from parts, for synthesized responses.
    pub fn new(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self {
            status,
            headers,
            body: body.into(),
            stored_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Rehydrate the snapshot into a response the caller can consume.
    pub fn into_response(self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }
}

/// Named cache storage trait
///
/// Each cache is identified by a string name (version-suffixed by the core's
/// router); entries within a cache are keyed by canonical request URL.
///
/// ## Semantics
///
/// - `put` overwrites any existing entry for the same URL (at most one stored
///   copy per URL per cache).
/// - `delete` and `drop_cache` are idempotent; removing something absent is
///   not an error and reports `false`.
/// - Caches are shared across all application instances backed by the same
///   storage; no locking discipline is imposed. Entries are immutable
///   snapshots, so last-writer-wins is acceptable.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{CacheStorage, ResponseSnapshot};
///
/// async fn warm(cache: &dyn CacheStorage) -> Result<()> {
///     let snapshot = ResponseSnapshot::new(200, "text/html", "<html></html>");
///     cache.put("briefcast-pages-v1", "https://app.example/", snapshot).await
/// }
/// ```
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Look up the snapshot stored for `url` in the cache named `cache`.
    ///
    /// Returns `Ok(None)` on a miss or when the cache does not exist.
    async fn get(&self, cache: &str, url: &str) -> Result<Option<ResponseSnapshot>>;

    /// Store a snapshot for `url`, creating the cache if needed.
    async fn put(&self, cache: &str, url: &str, snapshot: ResponseSnapshot) -> Result<()>;

    /// Remove the entry for `url`. Returns whether an entry existed.
    async fn delete(&self, cache: &str, url: &str) -> Result<bool>;

    /// Names of all caches currently present, including stale generations
    /// left behind by earlier versions.
    async fn cache_names(&self) -> Result<Vec<String>>;

    /// Delete an entire cache and its contents. Returns whether it existed.
    async fn drop_cache(&self, cache: &str) -> Result<bool>;

    /// Number of entries in a cache; 0 when the cache does not exist.
    async fn entry_count(&self, cache: &str) -> Result<usize>;
}
