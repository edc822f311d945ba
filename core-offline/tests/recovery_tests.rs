//! Integration tests for stale-build recovery

use std::sync::Arc;

use bridge_native::MemoryCacheStorage;
use bridge_traits::storage::{CacheStorage, ResponseSnapshot};
use core_offline::{ChunkRecovery, ResourceFailure};
use core_runtime::events::{EventBus, OfflineEvent, RecoveryEvent};

#[tokio::test]
async fn stale_chunk_failure_purges_every_cache_and_requests_reload() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let snapshot = ResponseSnapshot::new(200, "text/plain", "x");
    caches
        .put("briefcast-shell-v1", "https://x/", snapshot.clone())
        .await
        .unwrap();
    caches
        .put("workbox-precache-v2", "https://x/app.js", snapshot)
        .await
        .unwrap();

    let events = EventBus::new(10);
    let mut subscription = events.subscribe();
    let recovery = ChunkRecovery::new(Arc::clone(&caches) as Arc<dyn CacheStorage>, events);

    let failure = ResourceFailure::new("Loading chunk 42 failed")
        .with_source("/_next/static/chunks/app.abc123.js");
    assert!(recovery.handle(&failure).await);

    // Everything is gone, not just the application's cache family.
    assert!(caches.cache_names().await.unwrap().is_empty());

    let event = subscription.recv().await.unwrap();
    assert_eq!(
        event,
        OfflineEvent::Recovery(RecoveryEvent::ReloadRequired {
            reason: "Loading chunk 42 failed".to_string(),
        })
    );
}

#[tokio::test]
async fn unrecognized_failures_are_left_alone() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let snapshot = ResponseSnapshot::new(200, "text/plain", "x");
    caches
        .put("briefcast-shell-v1", "https://x/", snapshot)
        .await
        .unwrap();

    let events = EventBus::new(10);
    let recovery = ChunkRecovery::new(Arc::clone(&caches) as Arc<dyn CacheStorage>, events);

    let failure = ResourceFailure::new("image decode error").with_source("/covers/ep1.png");
    assert!(!recovery.handle(&failure).await);

    // Caches untouched.
    assert_eq!(caches.cache_names().await.unwrap().len(), 1);
}
