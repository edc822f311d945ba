//! Integration tests for the request interceptor
//!
//! Drives every caching strategy against in-memory cache storage and a
//! mocked fetch client, covering the pass-through, fallback, and
//! synthesized-response paths.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_native::MemoryCacheStorage;
use bridge_traits::http::{
    FetchClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy,
};
use bridge_traits::storage::CacheStorage;
use bytes::Bytes;
use core_offline::interceptor::{InterceptOutcome, RequestInterceptor};
use core_offline::routes::CacheName;
use core_offline::OfflineConfig;
use mockall::mock;

mock! {
    pub Fetch {}

    #[async_trait::async_trait]
    impl FetchClient for Fetch {
        async fn fetch(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse>;
        async fn fetch_with_retry(
            &self,
            request: HttpRequest,
            policy: RetryPolicy,
        ) -> bridge_traits::Result<HttpResponse>;
    }
}

fn response(status: u16, content_type: &str, body: &str) -> HttpResponse {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), content_type.to_string());
    HttpResponse {
        status,
        headers,
        body: Bytes::from(body.to_string()),
    }
}

fn cookie_response(body: &str) -> HttpResponse {
    let mut response = response(200, "audio/mpeg", body);
    response
        .headers
        .insert("set-cookie".to_string(), "session=abc".to_string());
    response
}

fn network_down() -> bridge_traits::BridgeError {
    bridge_traits::BridgeError::OperationFailed("Connection failed".to_string())
}

fn interceptor(
    caches: Arc<MemoryCacheStorage>,
    fetch: MockFetch,
) -> RequestInterceptor {
    RequestInterceptor::new(OfflineConfig::default(), caches, Arc::new(fetch))
}

#[tokio::test]
async fn non_get_requests_pass_through_untouched() {
    let caches = Arc::new(MemoryCacheStorage::new());
    // No fetch expectations: the interceptor must not touch the network
    // either.
    let interceptor = interceptor(Arc::clone(&caches), MockFetch::new());

    let request = HttpRequest::new(HttpMethod::Post, "https://x/files/a.mp3");
    let outcome = interceptor.handle(request).await;
    assert!(matches!(outcome, InterceptOutcome::Pass));

    // No cache was read from or written to.
    for cache in CacheName::all() {
        assert_eq!(caches.entry_count(&cache.storage_name()).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn excluded_urls_pass_through() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let interceptor = interceptor(caches, MockFetch::new());

    for url in [
        "https://x/api/podcasts/1",
        "https://x/sign-in",
        "https://x/main.js.map",
    ] {
        let outcome = interceptor.handle(HttpRequest::get(url)).await;
        assert!(matches!(outcome, InterceptOutcome::Pass), "url: {}", url);
    }
}

#[tokio::test]
async fn podcast_asset_miss_fetches_and_stores() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .times(1)
        .returning(|_, _| Ok(response(200, "audio/mpeg", "audio-bytes")));

    let interceptor = interceptor(Arc::clone(&caches), fetch);

    let outcome = interceptor
        .handle(HttpRequest::get("https://cdn.x/files/ep1.mp3"))
        .await;
    let served = outcome.into_response().unwrap();
    assert_eq!(served.status, 200);
    assert_eq!(served.body, Bytes::from("audio-bytes"));

    let stored = caches
        .get(&CacheName::Audio.storage_name(), "https://cdn.x/files/ep1.mp3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.body, Bytes::from("audio-bytes"));
}

#[tokio::test]
async fn podcast_asset_replays_byte_identical_while_offline() {
    let caches = Arc::new(MemoryCacheStorage::new());

    // First pass: network up, response gets stored.
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .times(1)
        .returning(|_, _| Ok(response(200, "audio/mpeg", "exact-bytes")));
    let online = interceptor(Arc::clone(&caches), fetch);
    online
        .handle(HttpRequest::get("https://cdn.x/files/ep1.mp3"))
        .await;

    // Second pass: network down; the cached copy must be byte-identical.
    let mut offline_fetch = MockFetch::new();
    offline_fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Err(network_down()));
    let offline = interceptor(Arc::clone(&caches), offline_fetch);

    let served = offline
        .handle(HttpRequest::get("https://cdn.x/files/ep1.mp3"))
        .await
        .into_response()
        .unwrap();
    assert_eq!(served.body, Bytes::from("exact-bytes"));
}

#[tokio::test]
async fn podcast_asset_network_failure_yields_synthetic_408() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Err(network_down()));

    let interceptor = interceptor(caches, fetch);
    let served = interceptor
        .handle(HttpRequest::get("https://cdn.x/files/ep1.mp3"))
        .await
        .into_response()
        .unwrap();

    assert_eq!(served.status, 408);
    assert_eq!(served.body, Bytes::from("Network error"));
}

#[tokio::test]
async fn authenticated_responses_are_never_stored() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Ok(cookie_response("private-audio")));

    let interceptor = interceptor(Arc::clone(&caches), fetch);
    let served = interceptor
        .handle(HttpRequest::get("https://cdn.x/files/ep1.mp3"))
        .await
        .into_response()
        .unwrap();

    // Caller still gets the response, but nothing is cached.
    assert_eq!(served.body, Bytes::from("private-audio"));
    assert_eq!(
        caches
            .entry_count(&CacheName::Audio.storage_name())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn storing_same_url_twice_keeps_one_entry_with_latest_content() {
    let caches = Arc::new(MemoryCacheStorage::new());

    for body in ["first", "second"] {
        let mut fetch = MockFetch::new();
        let body = body.to_string();
        fetch
            .expect_fetch_with_retry()
            .returning(move |_, _| Ok(response(200, "image/png", &body)));
        let interceptor = interceptor(Arc::clone(&caches), fetch);

        // The cache-first lookup would hit after the first store, so delete
        // the entry to force a refetch of the same URL.
        caches
            .delete(&CacheName::Images.storage_name(), "https://cdn.x/files/cover.png")
            .await
            .unwrap();
        interceptor
            .handle(HttpRequest::get("https://cdn.x/files/cover.png"))
            .await;
    }

    assert_eq!(
        caches
            .entry_count(&CacheName::Images.storage_name())
            .await
            .unwrap(),
        1
    );
    let stored = caches
        .get(
            &CacheName::Images.storage_name(),
            "https://cdn.x/files/cover.png",
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.body, Bytes::from("second"));
}

#[tokio::test]
async fn build_artifact_failure_without_cache_synthesizes_noop_script() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Err(network_down()));

    let interceptor = interceptor(caches, fetch);
    let served = interceptor
        .handle(HttpRequest::get(
            "https://x/_next/static/chunks/app.abc123.js",
        ))
        .await
        .into_response()
        .unwrap();

    assert_eq!(served.status, 200);
    assert_eq!(served.content_type(), Some("application/javascript"));
    let body = served.text().unwrap();
    assert!(body.contains("console.log"));
}

#[tokio::test]
async fn build_artifact_failure_without_cache_synthesizes_empty_stylesheet() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Err(network_down()));

    let interceptor = interceptor(caches, fetch);
    let served = interceptor
        .handle(HttpRequest::get(
            "https://x/_next/static/css/styles.abc123.css",
        ))
        .await
        .into_response()
        .unwrap();

    assert_eq!(served.status, 200);
    assert_eq!(served.content_type(), Some("text/css"));
}

#[tokio::test]
async fn build_artifact_falls_back_to_cached_copy() {
    let caches = Arc::new(MemoryCacheStorage::new());

    // Warm pass stores the chunk.
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .times(1)
        .returning(|_, _| Ok(response(200, "application/javascript", "real chunk")));
    let online = interceptor(Arc::clone(&caches), fetch);
    online
        .handle(HttpRequest::get("https://x/_next/static/chunks/app.js"))
        .await;

    // Offline pass serves the cached copy, not the placeholder.
    let mut offline_fetch = MockFetch::new();
    offline_fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Err(network_down()));
    let offline = interceptor(Arc::clone(&caches), offline_fetch);
    let served = offline
        .handle(HttpRequest::get("https://x/_next/static/chunks/app.js"))
        .await
        .into_response()
        .unwrap();

    assert_eq!(served.body, Bytes::from("real chunk"));
}

#[tokio::test]
async fn failed_navigation_without_cache_serves_offline_page() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Err(network_down()));

    let interceptor = interceptor(caches, fetch);
    let served = interceptor
        .handle(HttpRequest::get("https://x/").navigation())
        .await
        .into_response()
        .unwrap();

    assert_eq!(served.status, 200);
    assert_eq!(served.content_type(), Some("text/html"));
    let html = served.text().unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("You're Offline"));
}

#[tokio::test]
async fn failed_navigation_prefers_cached_page() {
    let caches = Arc::new(MemoryCacheStorage::new());

    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .times(1)
        .returning(|_, _| Ok(response(200, "text/html", "<html>library</html>")));
    let online = interceptor(Arc::clone(&caches), fetch);
    online
        .handle(HttpRequest::get("https://x/library").navigation())
        .await;

    let mut offline_fetch = MockFetch::new();
    offline_fetch
        .expect_fetch_with_retry()
        .returning(|_, _| Err(network_down()));
    let offline = interceptor(Arc::clone(&caches), offline_fetch);
    let served = offline
        .handle(HttpRequest::get("https://x/library").navigation())
        .await
        .into_response()
        .unwrap();

    assert_eq!(served.body, Bytes::from("<html>library</html>"));
}

#[tokio::test]
async fn default_strategy_stores_only_exact_200() {
    let caches = Arc::new(MemoryCacheStorage::new());
    let mut fetch = MockFetch::new();
    fetch
        .expect_fetch_with_retry()
        .times(1)
        .returning(|_, _| Ok(response(206, "font/woff2", "partial")));

    let interceptor = interceptor(Arc::clone(&caches), fetch);
    let served = interceptor
        .handle(HttpRequest::get("https://x/fonts/inter.woff2"))
        .await
        .into_response()
        .unwrap();

    assert_eq!(served.status, 206);
    assert_eq!(
        caches
            .entry_count(&CacheName::Shell.storage_name())
            .await
            .unwrap(),
        0
    );
}
