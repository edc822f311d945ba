//! # Request Interceptor
//!
//! Sits between the application and the network, applying the strategy
//! chosen by the [`RouteTable`](crate::routes::RouteTable) for every
//! outgoing request.
//!
//! ## Propagation policy
//!
//! The interceptor never returns an error to its caller. Every failure mode
//! resolves to either [`InterceptOutcome::Pass`] (the caller goes to the
//! network natively) or a response: cached, fetched, or synthesized.
//!
//! ## Concurrency
//!
//! `handle` borrows only shared `Arc` seams and read-only route tables, so
//! any number of requests may be in flight concurrently. Two simultaneous
//! misses for the same URL may both fetch and both store; entries are
//! immutable snapshots per URL, so last-writer-wins is harmless.

use std::sync::Arc;

use bridge_traits::http::{
    CredentialsMode, FetchClient, HttpRequest, HttpResponse, RequestMode, RetryPolicy,
};
use bridge_traits::storage::{CacheStorage, ResponseSnapshot};
use tracing::{debug, instrument, warn};

use crate::config::OfflineConfig;
use crate::fallback;
use crate::routes::{asset_cache_for_url, CacheName, RouteTable, Strategy};

/// Result of running a request through the interceptor.
#[derive(Debug)]
pub enum InterceptOutcome {
    /// The cache layer does not handle this request; the caller performs the
    /// network fetch itself, untouched.
    Pass,
    /// The cache layer produced a response (from cache, network, or
    /// synthesis).
    Response(HttpResponse),
}

impl InterceptOutcome {
    /// The response, when one was produced.
    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            InterceptOutcome::Pass => None,
            InterceptOutcome::Response(response) => Some(response),
        }
    }
}

/// The process-wide intercepting layer.
pub struct RequestInterceptor {
    caches: Arc<dyn CacheStorage>,
    fetch: Arc<dyn FetchClient>,
    routes: RouteTable,
    config: OfflineConfig,
}

impl RequestInterceptor {
    pub fn new(
        config: OfflineConfig,
        caches: Arc<dyn CacheStorage>,
        fetch: Arc<dyn FetchClient>,
    ) -> Self {
        Self {
            caches,
            fetch,
            routes: RouteTable::standard(),
            config,
        }
    }

    /// Handle one intercepted request.
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn handle(&self, request: HttpRequest) -> InterceptOutcome {
        match self.routes.classify(&request) {
            Strategy::Bypass => InterceptOutcome::Pass,
            Strategy::PodcastAsset => {
                InterceptOutcome::Response(self.podcast_asset(request).await)
            }
            Strategy::BuildArtifact => {
                InterceptOutcome::Response(self.build_artifact(request).await)
            }
            Strategy::Navigation => InterceptOutcome::Response(self.navigation(request).await),
            Strategy::Default => InterceptOutcome::Response(self.cache_first(request).await),
        }
    }

    /// A response may be stored only for a read-only retrieval of a
    /// fetchable URL, and only when it carries no session cookie.
    fn store_eligible(request: &HttpRequest, response: &HttpResponse) -> bool {
        request.method.is_cacheable()
            && request.has_fetchable_scheme()
            && !response.sets_cookie()
    }

    /// Cache lookup that treats storage-engine failures as misses.
    async fn lookup(&self, cache: CacheName, url: &str) -> Option<ResponseSnapshot> {
        match self.caches.get(&cache.storage_name(), url).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(cache = %cache.storage_name(), error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Store a snapshot, logging rather than propagating failure.
    async fn store(&self, cache: CacheName, url: &str, response: &HttpResponse) {
        let snapshot = ResponseSnapshot::of(response);
        if let Err(e) = self.caches.put(&cache.storage_name(), url, snapshot).await {
            warn!(cache = %cache.storage_name(), url = %url, error = %e, "Failed to store response");
        } else {
            debug!(cache = %cache.storage_name(), url = %url, "Stored response");
        }
    }

    /// Podcast-asset strategy: cache-first with opportunistic store.
    async fn podcast_asset(&self, request: HttpRequest) -> HttpResponse {
        let cache = asset_cache_for_url(&request.url);
        let url = request.url.clone();

        if let Some(hit) = self.lookup(cache, &url).await {
            debug!(cache = %cache.storage_name(), "Serving podcast asset from cache");
            return hit.into_response();
        }

        let fetch_request = request
            .mode(RequestMode::Cors)
            .timeout(self.config.fetch_timeout);

        match self
            .fetch
            .fetch_with_retry(fetch_request.clone(), RetryPolicy::none())
            .await
        {
            Ok(response) => {
                if response.status == 200 && Self::store_eligible(&fetch_request, &response) {
                    self.store(cache, &url, &response).await;
                }
                response
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Podcast asset fetch failed");
                fallback::network_error().into_response()
            }
        }
    }

    /// Build-artifact strategy: network-first with shell fallback and
    /// placeholder synthesis.
    async fn build_artifact(&self, request: HttpRequest) -> HttpResponse {
        let url = request.url.clone();
        let fetch_request = request
            .credentials(CredentialsMode::Include)
            .timeout(self.config.fetch_timeout);

        match self
            .fetch
            .fetch_with_retry(fetch_request.clone(), RetryPolicy::none())
            .await
        {
            Ok(response) => {
                if response.is_success() && Self::store_eligible(&fetch_request, &response) {
                    self.store(CacheName::Shell, &url, &response).await;
                }
                response
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Build artifact fetch failed, trying cache");

                if let Some(hit) = self.lookup(CacheName::Shell, &url).await {
                    return hit.into_response();
                }

                if url.contains(".js") {
                    fallback::placeholder_script().into_response()
                } else if url.contains(".css") {
                    fallback::placeholder_stylesheet().into_response()
                } else {
                    fallback::network_error().into_response()
                }
            }
        }
    }

    /// Navigation strategy: network-first with offline-page fallback.
    async fn navigation(&self, request: HttpRequest) -> HttpResponse {
        let url = request.url.clone();
        let fetch_request = request.timeout(self.config.fetch_timeout);

        match self
            .fetch
            .fetch_with_retry(fetch_request.clone(), RetryPolicy::none())
            .await
        {
            Ok(response) => {
                if response.is_success() && Self::store_eligible(&fetch_request, &response) {
                    self.store(CacheName::Pages, &url, &response).await;
                }
                response
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Navigation fetch failed, trying cache");

                // Earlier visits land in Pages; the install-time precache
                // lands in Shell. Check both before synthesizing.
                if let Some(hit) = self.lookup(CacheName::Pages, &url).await {
                    return hit.into_response();
                }
                if let Some(hit) = self.lookup(CacheName::Shell, &url).await {
                    return hit.into_response();
                }

                debug!(url = %url, "No cached page, serving offline page");
                fallback::offline_page().into_response()
            }
        }
    }

    /// Default strategy: generic cache-first.
    async fn cache_first(&self, request: HttpRequest) -> HttpResponse {
        let url = request.url.clone();

        if let Some(hit) = self.lookup(CacheName::Shell, &url).await {
            return hit.into_response();
        }

        let fetch_request = request.timeout(self.config.fetch_timeout);

        match self
            .fetch
            .fetch_with_retry(fetch_request.clone(), RetryPolicy::none())
            .await
        {
            Ok(response) => {
                // Exactly 200: partial or redirected content stays uncached.
                if response.status == 200 && Self::store_eligible(&fetch_request, &response) {
                    self.store(CacheName::Shell, &url, &response).await;
                }
                response
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed in default handler");
                fallback::network_error().into_response()
            }
        }
    }
}
