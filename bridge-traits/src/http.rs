//! Fetch Client Abstraction
//!
//! Provides async outbound HTTP operations with retry logic and per-request
//! mode/credentials control, mirroring what an intercepting network layer
//! needs to replay requests on behalf of an application.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    /// Read-only retrieval methods are the only ones eligible for caching.
    pub fn is_cacheable(self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

/// Cross-origin behavior requested for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    #[default]
    SameOrigin,
    /// Cross-origin with CORS checks; used for podcast asset downloads.
    Cors,
    /// Opaque cross-origin fetch without CORS checks.
    NoCors,
}

/// Whether ambient credentials (cookies, auth headers) travel with a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// An outgoing request as seen by the interception layer.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub mode: RequestMode,
    pub credentials: CredentialsMode,
    /// True when the request is a top-level page navigation.
    pub navigation: bool,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            mode: RequestMode::default(),
            credentials: CredentialsMode::default(),
            navigation: false,
            timeout: None,
        }
    }

    /// Shorthand for the common case: a plain GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn credentials(mut self, credentials: CredentialsMode) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn navigation(mut self) -> Self {
        self.navigation = true;
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// True when the URL uses a fetchable network scheme. Opaque schemes
    /// (data:, blob:, extension schemes) can be neither fetched on behalf of
    /// the caller nor stored in a cache.
    pub fn has_fetchable_scheme(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Look up a header by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// A response that carries a session cookie is user-specific and must
    /// never be stored in a shared cache.
    pub fn sets_cookie(&self) -> bool {
        self.header("set-cookie").is_some()
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| {
            crate::error::BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e))
        })
    }
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that fetches exactly once. Interception paths use this: the
    /// caller already has its own fallback (cache, synthesized response), so
    /// retrying inside the bridge only delays that fallback.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Async fetch client trait
///
/// Abstracts outbound network fetches so the core can run against a real
/// HTTP stack, an embedded host, or a test double. Implementations should
/// handle connection pooling, TLS, and honoring the request's timeout.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{FetchClient, HttpRequest};
///
/// async fn fetch_cover(client: &dyn FetchClient) -> Result<bytes::Bytes> {
///     let request = HttpRequest::get("https://cdn.example.com/cover.png");
///     let response = client.fetch(request).await?;
///     Ok(response.body)
/// }
/// ```
#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Execute a fetch.
    ///
    /// # Errors
    ///
    /// Returns error if the network connection fails, TLS validation fails,
    /// or the request times out. Non-2xx statuses are NOT errors; callers
    /// decide how to treat them.
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute a fetch with a custom retry policy.
    async fn fetch_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        // Default implementation: single attempt. Implementations override
        // for real backoff behavior.
        let _ = policy;
        self.fetch(request).await
    }
}
