//! # Core Configuration
//!
//! Dependency-injected capability context for the offline core.
//!
//! Capabilities the core needs (fetch client, cache storage, database) are
//! provided explicitly here instead of being discovered through ambient
//! globals; a missing capability fails fast at construction with a
//! descriptive error rather than surfacing later as a broken code path.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .fetch_client(Arc::new(ReqwestFetchClient::new()))
//!     .cache_storage(Arc::new(MemoryCacheStorage::new()))
//!     .database(Arc::new(adapter))
//!     .build()?;
//! ```

use std::sync::Arc;

use bridge_traits::database::DatabaseAdapter;
use bridge_traits::http::FetchClient;
use bridge_traits::storage::CacheStorage;

use crate::error::{Error, Result};
use crate::events::{EventBus, DEFAULT_EVENT_BUFFER_SIZE};

/// Validated capability context handed to the offline core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Outbound fetch capability.
    pub fetch_client: Arc<dyn FetchClient>,
    /// Named-cache storage capability.
    pub cache_storage: Arc<dyn CacheStorage>,
    /// Durable structured-storage capability.
    pub database: Arc<dyn DatabaseAdapter>,
    /// Shared event bus for worker/library/recovery broadcasts.
    pub events: EventBus,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("fetch_client", &"Arc<dyn FetchClient>")
            .field("cache_storage", &"Arc<dyn CacheStorage>")
            .field("database", &"Arc<dyn DatabaseAdapter>")
            .field("events", &self.events)
            .finish()
    }
}

impl CoreConfig {
    /// Start building a configuration.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    fetch_client: Option<Arc<dyn FetchClient>>,
    cache_storage: Option<Arc<dyn CacheStorage>>,
    database: Option<Arc<dyn DatabaseAdapter>>,
    event_capacity: Option<usize>,
}

impl CoreConfigBuilder {
    /// Inject the outbound fetch capability.
    pub fn fetch_client(mut self, client: Arc<dyn FetchClient>) -> Self {
        self.fetch_client = Some(client);
        self
    }

    /// Inject the named-cache storage capability.
    pub fn cache_storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.cache_storage = Some(storage);
        self
    }

    /// Inject the durable structured-storage capability.
    pub fn database(mut self, database: Arc<dyn DatabaseAdapter>) -> Self {
        self.database = Some(database);
        self
    }

    /// Override the event bus buffer capacity.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] naming the first absent
    /// capability, with a hint about which bridge provides it.
    pub fn build(self) -> Result<CoreConfig> {
        let fetch_client = self.fetch_client.ok_or_else(|| Error::CapabilityMissing {
            capability: "FetchClient".to_string(),
            message: "No fetch client provided. Native hosts: inject \
                      bridge_native::ReqwestFetchClient."
                .to_string(),
        })?;

        let cache_storage = self.cache_storage.ok_or_else(|| Error::CapabilityMissing {
            capability: "CacheStorage".to_string(),
            message: "No cache storage provided. Native hosts: inject \
                      bridge_native::MemoryCacheStorage or a durable backend."
                .to_string(),
        })?;

        let database = self.database.ok_or_else(|| Error::CapabilityMissing {
            capability: "DatabaseAdapter".to_string(),
            message: "No database adapter provided. Native hosts: inject \
                      bridge_native::SqliteAdapter."
                .to_string(),
        })?;

        let capacity = self.event_capacity.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        if capacity == 0 {
            return Err(Error::Config(
                "event_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(CoreConfig {
            fetch_client,
            cache_storage,
            database,
            events: EventBus::new(capacity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::database::{QueryRow, QueryValue};
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::storage::ResponseSnapshot;

    struct StubFetch;

    #[async_trait]
    impl FetchClient for StubFetch {
        async fn fetch(&self, _request: HttpRequest) -> bridge_traits::Result<HttpResponse> {
            Err(bridge_traits::BridgeError::NotAvailable("stub".into()))
        }
    }

    struct StubCaches;

    #[async_trait]
    impl CacheStorage for StubCaches {
        async fn get(
            &self,
            _cache: &str,
            _url: &str,
        ) -> bridge_traits::Result<Option<ResponseSnapshot>> {
            Ok(None)
        }
        async fn put(
            &self,
            _cache: &str,
            _url: &str,
            _snapshot: ResponseSnapshot,
        ) -> bridge_traits::Result<()> {
            Ok(())
        }
        async fn delete(&self, _cache: &str, _url: &str) -> bridge_traits::Result<bool> {
            Ok(false)
        }
        async fn cache_names(&self) -> bridge_traits::Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn drop_cache(&self, _cache: &str) -> bridge_traits::Result<bool> {
            Ok(false)
        }
        async fn entry_count(&self, _cache: &str) -> bridge_traits::Result<usize> {
            Ok(0)
        }
    }

    struct StubDb;

    #[async_trait]
    impl DatabaseAdapter for StubDb {
        async fn query(
            &self,
            _query: &str,
            _params: &[QueryValue],
        ) -> bridge_traits::Result<Vec<QueryRow>> {
            Ok(Vec::new())
        }
        async fn execute(
            &self,
            _statement: &str,
            _params: &[QueryValue],
        ) -> bridge_traits::Result<u64> {
            Ok(0)
        }
        async fn query_one_optional(
            &self,
            _query: &str,
            _params: &[QueryValue],
        ) -> bridge_traits::Result<Option<QueryRow>> {
            Ok(None)
        }
        async fn execute_batch(
            &self,
            _statements: &[(&str, &[QueryValue])],
        ) -> bridge_traits::Result<Vec<u64>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_build_with_all_capabilities() {
        let config = CoreConfig::builder()
            .fetch_client(Arc::new(StubFetch))
            .cache_storage(Arc::new(StubCaches))
            .database(Arc::new(StubDb))
            .build();

        assert!(config.is_ok());
    }

    #[test]
    fn test_missing_fetch_client_fails_fast() {
        let result = CoreConfig::builder()
            .cache_storage(Arc::new(StubCaches))
            .database(Arc::new(StubDb))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "FetchClient");
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_missing_database_fails_fast() {
        let result = CoreConfig::builder()
            .fetch_client(Arc::new(StubFetch))
            .cache_storage(Arc::new(StubCaches))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { capability, .. }) if capability == "DatabaseAdapter"
        ));
    }

    #[test]
    fn test_zero_event_capacity_rejected() {
        let result = CoreConfig::builder()
            .fetch_client(Arc::new(StubFetch))
            .cache_storage(Arc::new(StubCaches))
            .database(Arc::new(StubDb))
            .event_capacity(0)
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
