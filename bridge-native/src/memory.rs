//! In-Memory Named Cache Storage
//!
//! A `CacheStorage` implementation backed by process memory. Suitable for
//! embedding hosts that manage their own durability and for tests; contents
//! do not survive a restart.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::storage::{CacheStorage, ResponseSnapshot};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process named cache storage.
///
/// Each named cache is an independent URL → snapshot map. All operations are
/// last-writer-wins; snapshots are immutable once stored.
#[derive(Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<HashMap<String, HashMap<String, ResponseSnapshot>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn get(&self, cache: &str, url: &str) -> Result<Option<ResponseSnapshot>> {
        let caches = self.caches.read().await;
        Ok(caches.get(cache).and_then(|c| c.get(url)).cloned())
    }

    async fn put(&self, cache: &str, url: &str, snapshot: ResponseSnapshot) -> Result<()> {
        let mut caches = self.caches.write().await;
        caches
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), snapshot);
        debug!(cache = %cache, url = %url, "Stored snapshot");
        Ok(())
    }

    async fn delete(&self, cache: &str, url: &str) -> Result<bool> {
        let mut caches = self.caches.write().await;
        Ok(caches
            .get_mut(cache)
            .map(|c| c.remove(url).is_some())
            .unwrap_or(false))
    }

    async fn cache_names(&self) -> Result<Vec<String>> {
        let caches = self.caches.read().await;
        Ok(caches.keys().cloned().collect())
    }

    async fn drop_cache(&self, cache: &str) -> Result<bool> {
        let mut caches = self.caches.write().await;
        let existed = caches.remove(cache).is_some();
        if existed {
            debug!(cache = %cache, "Dropped cache");
        }
        Ok(existed)
    }

    async fn entry_count(&self, cache: &str) -> Result<usize> {
        let caches = self.caches.read().await;
        Ok(caches.get(cache).map(|c| c.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(200, "text/plain", body.to_string())
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let storage = MemoryCacheStorage::new();
        storage
            .put("cache-a", "https://x/1", snapshot("one"))
            .await
            .unwrap();

        let hit = storage.get("cache-a", "https://x/1").await.unwrap();
        assert_eq!(hit.unwrap().body, bytes::Bytes::from("one"));

        let miss = storage.get("cache-a", "https://x/2").await.unwrap();
        assert!(miss.is_none());

        let wrong_cache = storage.get("cache-b", "https://x/1").await.unwrap();
        assert!(wrong_cache.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_entry() {
        let storage = MemoryCacheStorage::new();
        storage
            .put("cache-a", "https://x/1", snapshot("old"))
            .await
            .unwrap();
        storage
            .put("cache-a", "https://x/1", snapshot("new"))
            .await
            .unwrap();

        assert_eq!(storage.entry_count("cache-a").await.unwrap(), 1);
        let hit = storage.get("cache-a", "https://x/1").await.unwrap().unwrap();
        assert_eq!(hit.body, bytes::Bytes::from("new"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let storage = MemoryCacheStorage::new();
        storage
            .put("cache-a", "https://x/1", snapshot("one"))
            .await
            .unwrap();

        assert!(storage.delete("cache-a", "https://x/1").await.unwrap());
        assert!(!storage.delete("cache-a", "https://x/1").await.unwrap());
        assert!(!storage.delete("cache-missing", "https://x/1").await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_cache_and_names() {
        let storage = MemoryCacheStorage::new();
        storage.put("a", "u1", snapshot("1")).await.unwrap();
        storage.put("b", "u2", snapshot("2")).await.unwrap();

        let mut names = storage.cache_names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

        assert!(storage.drop_cache("a").await.unwrap());
        assert!(!storage.drop_cache("a").await.unwrap());
        assert_eq!(storage.cache_names().await.unwrap(), vec!["b".to_string()]);
    }
}
