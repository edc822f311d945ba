//! # Offline Worker
//!
//! The background half of the offline subsystem: a single event-driven task
//! that precaches the application shell on install, garbage-collects stale
//! cache generations on activation, and then serves sync-protocol commands
//! until its channel closes.
//!
//! The worker shares no mutable state with request handlers; it owns its
//! command receiver and talks to the world through the cache storage seam
//! and the event bus.

use std::sync::Arc;

use bridge_traits::http::{FetchClient, HttpRequest, RequestMode, RetryPolicy};
use bridge_traits::storage::{CacheStorage, ResponseSnapshot};
use core_runtime::events::{EventBus, OfflineEvent, WorkerEvent};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::OfflineConfig;
use crate::protocol::{PodcastManifest, WorkerCommand};
use crate::routes::{asset_cache_for_url, metadata_key, CacheName};

/// Lifecycle states of the background worker, observable through the
/// registry's watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Precaching the shell manifest.
    Installing,
    /// Installed, holding back activation until a skip-waiting signal.
    Waiting,
    /// Garbage-collecting stale cache generations.
    Activating,
    /// In control; serving commands.
    Activated,
    /// Command channel closed; the worker has exited.
    Stopped,
}

/// The background interceptor process.
pub struct OfflineWorker {
    config: OfflineConfig,
    caches: Arc<dyn CacheStorage>,
    fetch: Arc<dyn FetchClient>,
    events: EventBus,
    state: watch::Sender<WorkerState>,
    commands: mpsc::Receiver<WorkerCommand>,
}

impl OfflineWorker {
    pub(crate) fn new(
        config: OfflineConfig,
        caches: Arc<dyn CacheStorage>,
        fetch: Arc<dyn FetchClient>,
        events: EventBus,
        state: watch::Sender<WorkerState>,
        commands: mpsc::Receiver<WorkerCommand>,
    ) -> Self {
        Self {
            config,
            caches,
            fetch,
            events,
            state,
            commands,
        }
    }

    /// Run the worker to completion: install, activate, then serve commands
    /// until the channel closes.
    pub async fn run(mut self) {
        self.install().await;

        if !self.config.skip_waiting_on_install && !self.wait_for_skip_signal().await {
            self.state.send_replace(WorkerState::Stopped);
            return;
        }

        self.activate().await;

        while let Some(command) = self.commands.recv().await {
            self.handle_command(command).await;
        }

        info!("Worker command channel closed, stopping");
        self.state.send_replace(WorkerState::Stopped);
    }

    /// Exhaustive command dispatch.
    async fn handle_command(&self, command: WorkerCommand) {
        match command {
            WorkerCommand::SkipWaiting => {
                // Already active; nothing to skip.
                debug!("SkipWaiting received while active, ignoring");
            }
            WorkerCommand::CachePodcast { podcast } => self.cache_podcast(podcast).await,
            WorkerCommand::RemoveCachedPodcast {
                podcast_id,
                asset_urls,
            } => self.remove_podcast(&podcast_id, &asset_urls).await,
        }
    }

    /// Hold in the Waiting state until a skip-waiting signal arrives.
    /// Returns `false` when the channel closes first.
    async fn wait_for_skip_signal(&mut self) -> bool {
        self.state.send_replace(WorkerState::Waiting);
        info!("Worker installed, waiting for skip-waiting signal");

        while let Some(command) = self.commands.recv().await {
            match command {
                WorkerCommand::SkipWaiting => return true,
                other => {
                    warn!(command = ?other, "Command received before activation, dropping");
                }
            }
        }
        false
    }

    /// Install: eagerly fetch and store the shell manifest with
    /// individually-isolated fetches, so one failing resource never aborts
    /// the rest. Proceeds to activation regardless of partial failure.
    #[instrument(skip(self))]
    async fn install(&self) {
        self.state.send_replace(WorkerState::Installing);

        let shell_urls = self.config.shell_urls();
        let total = shell_urls.len();

        let fetches = shell_urls.into_iter().map(|url| {
            let caches = Arc::clone(&self.caches);
            let fetch = Arc::clone(&self.fetch);
            let timeout = self.config.fetch_timeout;
            async move {
                let request = HttpRequest::get(&url).timeout(timeout);
                match fetch.fetch_with_retry(request, RetryPolicy::none()).await {
                    Ok(response) if response.is_success() => {
                        let snapshot = ResponseSnapshot::of(&response);
                        match caches
                            .put(&CacheName::Shell.storage_name(), &url, snapshot)
                            .await
                        {
                            Ok(()) => {
                                debug!(url = %url, "Precached shell resource");
                                true
                            }
                            Err(e) => {
                                warn!(url = %url, error = %e, "Failed to store shell resource");
                                false
                            }
                        }
                    }
                    Ok(response) => {
                        warn!(url = %url, status = response.status, "Shell resource fetch not successful");
                        false
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "Shell resource fetch failed");
                        false
                    }
                }
            }
        });

        let results = join_all(fetches).await;
        let cached = results.iter().filter(|ok| **ok).count();
        info!(cached, total, "Shell precache complete");
    }

    /// Activate: delete every cache that belongs to this application's
    /// naming family but is not in the currently declared set, then take
    /// control immediately.
    #[instrument(skip(self))]
    async fn activate(&self) {
        self.state.send_replace(WorkerState::Activating);

        match self.caches.cache_names().await {
            Ok(names) => {
                for name in names {
                    if CacheName::is_family_name(&name) && !CacheName::is_declared(&name) {
                        info!(cache = %name, "Deleting stale cache generation");
                        if let Err(e) = self.caches.drop_cache(&name).await {
                            warn!(cache = %name, error = %e, "Failed to delete stale cache");
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to enumerate caches during activation");
            }
        }

        self.state.send_replace(WorkerState::Activated);
        self.events
            .emit(OfflineEvent::Worker(WorkerEvent::Activated))
            .ok();
        info!("Worker activated and claiming clients");
    }

    /// Prefetch every present asset of a podcast (best-effort, one failure
    /// never aborts the others), store the metadata blob, and broadcast
    /// completion.
    #[instrument(skip(self, manifest), fields(podcast_id = %manifest.id, job_id = %Uuid::new_v4()))]
    async fn cache_podcast(&self, manifest: PodcastManifest) {
        if manifest.validate().is_err() {
            warn!("Dropping cache request with invalid manifest");
            return;
        }

        let targets: Vec<String> = manifest
            .asset_urls()
            .into_iter()
            .map(|(_, url)| url.to_string())
            .collect();

        info!(assets = targets.len(), "Caching podcast assets");

        let downloads = targets.iter().map(|url| self.prefetch_asset(url));
        let results = join_all(downloads).await;
        let failed = results.iter().filter(|ok| !**ok).count();
        if failed > 0 {
            warn!(failed, total = targets.len(), "Some podcast assets failed to cache");
        }

        self.store_metadata(&manifest).await;

        self.events
            .emit(OfflineEvent::Worker(WorkerEvent::PodcastCached {
                podcast_id: manifest.id.clone(),
            }))
            .ok();
    }

    /// Download one asset into its cache. Returns `false` on any failure.
    async fn prefetch_asset(&self, url: &str) -> bool {
        let request = HttpRequest::get(url)
            .mode(RequestMode::Cors)
            .timeout(self.config.fetch_timeout);

        if !request.has_fetchable_scheme() {
            warn!(url = %url, "Skipping asset with unfetchable scheme");
            return false;
        }

        match self.fetch.fetch_with_retry(request, RetryPolicy::none()).await {
            Ok(response) if response.is_success() && !response.sets_cookie() => {
                let cache = asset_cache_for_url(url);
                let snapshot = ResponseSnapshot::of(&response);
                match self.caches.put(&cache.storage_name(), url, snapshot).await {
                    Ok(()) => {
                        debug!(url = %url, cache = %cache.storage_name(), "Cached podcast asset");
                        true
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to store podcast asset");
                        false
                    }
                }
            }
            Ok(response) => {
                warn!(url = %url, status = response.status, "Asset fetch not cacheable");
                false
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Asset fetch failed");
                false
            }
        }
    }

    /// Store the full manifest JSON under the derived metadata key.
    async fn store_metadata(&self, manifest: &PodcastManifest) {
        let body = match serde_json::to_vec(manifest) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to encode podcast metadata");
                return;
            }
        };

        let key = metadata_key(&manifest.id);
        let snapshot = ResponseSnapshot::new(200, "application/json", body);
        if let Err(e) = self
            .caches
            .put(&CacheName::PodcastMetadata.storage_name(), &key, snapshot)
            .await
        {
            warn!(key = %key, error = %e, "Failed to store podcast metadata");
        } else {
            debug!(key = %key, "Stored podcast metadata");
        }
    }

    /// Delete the metadata entry and each listed asset, then broadcast
    /// removal.
    #[instrument(skip(self, asset_urls), fields(podcast_id = %podcast_id))]
    async fn remove_podcast(&self, podcast_id: &str, asset_urls: &[String]) {
        let key = metadata_key(podcast_id);
        match self
            .caches
            .delete(&CacheName::PodcastMetadata.storage_name(), &key)
            .await
        {
            Ok(existed) => debug!(key = %key, existed, "Removed podcast metadata"),
            Err(e) => warn!(key = %key, error = %e, "Failed to remove podcast metadata"),
        }

        for url in asset_urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                warn!(url = %url, "Skipping asset with unfetchable scheme");
                continue;
            }

            let cache = asset_cache_for_url(url);
            match self.caches.delete(&cache.storage_name(), url).await {
                Ok(existed) => {
                    debug!(url = %url, existed, "Removed asset from cache");
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to remove asset from cache");
                }
            }
        }

        self.events
            .emit(OfflineEvent::Worker(WorkerEvent::PodcastRemoved {
                podcast_id: podcast_id.to_string(),
            }))
            .ok();
        info!("Podcast removed from caches");
    }
}
