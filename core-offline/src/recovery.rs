//! # Stale-Build Recovery
//!
//! Aggressively caching build artifacts is unsound in general: after a
//! redeploy, a cached page can reference chunk hashes that no longer exist.
//! This module is the safety net for that trade-off: it recognizes
//! resource-load failures characteristic of a stale cache, purges every
//! cache, and signals the host to reload.

use std::sync::Arc;

use bridge_traits::storage::CacheStorage;
use core_runtime::events::{EventBus, OfflineEvent, RecoveryEvent};
use tracing::{error, info, instrument, warn};

/// A resource-load failure reported by the host.
#[derive(Debug, Clone)]
pub struct ResourceFailure {
    /// Failure message as surfaced by the host.
    pub message: String,
    /// Path or URL of the resource that failed, when known.
    pub source: Option<String>,
}

impl ResourceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Failure messages that indicate a stale build chunk.
const STALE_CHUNK_MESSAGES: &[&str] = &[
    "Failed to load chunk",
    "Loading chunk",
    "Loading CSS chunk",
    "dynamic import",
    "loadable component",
];

/// Whether a failure looks like a stale-chunk mismatch rather than an
/// ordinary load error.
pub fn is_stale_chunk_failure(failure: &ResourceFailure) -> bool {
    if STALE_CHUNK_MESSAGES
        .iter()
        .any(|pattern| failure.message.contains(pattern))
    {
        return true;
    }

    failure
        .source
        .as_deref()
        .map(|source| source.contains("static/chunks"))
        .unwrap_or(false)
}

/// Purges caches and requests a reload when a stale-chunk failure is
/// detected.
pub struct ChunkRecovery {
    caches: Arc<dyn CacheStorage>,
    events: EventBus,
}

impl ChunkRecovery {
    pub fn new(caches: Arc<dyn CacheStorage>, events: EventBus) -> Self {
        Self { caches, events }
    }

    /// Inspect a failure; if it is characteristic of a stale build, purge
    /// every cache and broadcast `ReloadRequired`.
    ///
    /// Returns whether the failure was handled. Unrecognized failures are
    /// left to default handling.
    #[instrument(skip(self, failure), fields(message = %failure.message))]
    pub async fn handle(&self, failure: &ResourceFailure) -> bool {
        if !is_stale_chunk_failure(failure) {
            return false;
        }

        error!("Stale chunk failure detected, purging all caches");
        self.purge_all_caches().await;

        self.events
            .emit(OfflineEvent::Recovery(RecoveryEvent::ReloadRequired {
                reason: failure.message.clone(),
            }))
            .ok();

        true
    }

    /// Drop every cache, not just this application's family: a stale-build
    /// state is fatal to the page instance, so everything goes.
    async fn purge_all_caches(&self) {
        let names = match self.caches.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate caches during recovery");
                return;
            }
        };

        for name in names {
            match self.caches.drop_cache(&name).await {
                Ok(_) => info!(cache = %name, "Dropped cache during recovery"),
                Err(e) => warn!(cache = %name, error = %e, "Failed to drop cache"),
            }
        }
    }
}
