//! # Offline Library Facade
//!
//! The collaborator interface the application UI consumes. Every operation
//! follows the never-throw policy: storage-engine and network failures are
//! caught here, logged, and converted to `false`/`None`/empty results, so UI
//! code proceeds as if offline data were simply unavailable.

use std::sync::Arc;

use bridge_traits::http::{FetchClient, HttpRequest, RequestMode};
use bytes::Bytes;
use core_runtime::events::{EventBus, LibraryEvent, OfflineEvent};
use tracing::{debug, info, instrument, warn};

use crate::config::OfflineConfig;
use crate::generation::PlaybackGate;
use crate::protocol::PodcastManifest;
use crate::store::models::{AssetKind, CachedAsset, PodcastRecord};
use crate::store::repository::{AssetStore, PodcastStore};

/// A local reference to an asset resolved by [`OfflineLibrary::load_asset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    /// Served from the structured store.
    Local { body: Bytes, content_type: String },
    /// Not available locally; the caller should use the source URL.
    Remote { url: String },
}

impl ResolvedAsset {
    pub fn is_local(&self) -> bool {
        matches!(self, ResolvedAsset::Local { .. })
    }
}

/// A podcast record with its three asset references resolved.
#[derive(Debug, Clone)]
pub struct OfflinePodcast {
    pub record: PodcastRecord,
    pub audio: Option<ResolvedAsset>,
    pub cover_image: Option<ResolvedAsset>,
    pub transcript: Option<ResolvedAsset>,
}

/// Foreground half of the offline subsystem.
pub struct OfflineLibrary {
    config: OfflineConfig,
    podcasts: Arc<dyn PodcastStore>,
    assets: Arc<dyn AssetStore>,
    fetch: Arc<dyn FetchClient>,
    events: EventBus,
    gate: PlaybackGate,
}

impl OfflineLibrary {
    pub fn new(
        config: OfflineConfig,
        podcasts: Arc<dyn PodcastStore>,
        assets: Arc<dyn AssetStore>,
        fetch: Arc<dyn FetchClient>,
        events: EventBus,
    ) -> Self {
        Self {
            config,
            podcasts,
            assets,
            fetch,
            events,
            gate: PlaybackGate::new(),
        }
    }

    /// Create tables for both record families.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> crate::error::Result<()> {
        self.podcasts.initialize().await?;
        self.assets.initialize().await?;
        info!("Offline library initialized");
        Ok(())
    }

    /// Whether a podcast was saved for offline playback.
    #[instrument(skip(self))]
    pub async fn is_available_offline(&self, podcast_id: &str) -> bool {
        if podcast_id.is_empty() {
            return false;
        }

        match self.podcasts.get(podcast_id).await {
            Ok(Some(record)) => record.saved_offline,
            Ok(None) => false,
            Err(e) => {
                warn!(podcast_id = %podcast_id, error = %e, "Offline availability check failed");
                false
            }
        }
    }

    /// Resolve an asset: a fresh stored copy is served locally; a stale,
    /// corrupt, or missing one is re-downloaded; a failed download falls
    /// back to the remote URL.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn load_asset(&self, url: &str, kind: AssetKind) -> Option<ResolvedAsset> {
        if url.is_empty() {
            return None;
        }

        match self.assets.get(url).await {
            Ok(Some(asset)) if self.servable(&asset) => {
                debug!("Serving asset from structured store");
                return Some(ResolvedAsset::Local {
                    body: asset.body,
                    content_type: asset.content_type,
                });
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Asset lookup failed, treating as miss");
            }
        }

        match self.download_asset(url, kind).await {
            Some(asset) => Some(ResolvedAsset::Local {
                body: asset.body,
                content_type: asset.content_type,
            }),
            None => Some(ResolvedAsset::Remote {
                url: url.to_string(),
            }),
        }
    }

    /// Save a podcast for offline use: download the three assets
    /// concurrently (individual failures tolerated and surfaced), then store
    /// the record with `saved_offline = true`.
    ///
    /// Returns `false` only when the record itself could not be stored.
    #[instrument(skip(self, manifest), fields(podcast_id = %manifest.id))]
    pub async fn save_offline(&self, manifest: &PodcastManifest) -> bool {
        if manifest.validate().is_err() {
            warn!("Refusing to save podcast with invalid manifest");
            return false;
        }

        let targets = manifest.asset_urls();
        let downloads = targets
            .iter()
            .map(|(kind, url)| self.download_asset(url, *kind));
        let results = futures::future::join_all(downloads).await;

        let failed_assets = results.iter().filter(|r| r.is_none()).count() as u32;
        if failed_assets > 0 {
            warn!(
                failed = failed_assets,
                total = targets.len(),
                "Partial failure while saving podcast assets"
            );
        }

        let record = PodcastRecord::from_manifest(manifest);
        if let Err(e) = self.podcasts.put(&record).await {
            warn!(error = %e, "Failed to store podcast record");
            return false;
        }

        info!(failed = failed_assets, "Podcast saved for offline use");
        self.events
            .emit(OfflineEvent::Library(LibraryEvent::CachingComplete {
                podcast_id: manifest.id.clone(),
                failed_assets,
            }))
            .ok();

        true
    }

    /// Load a record with each referenced asset resolved.
    #[instrument(skip(self))]
    pub async fn load_from_storage(&self, podcast_id: &str) -> Option<OfflinePodcast> {
        if podcast_id.is_empty() {
            return None;
        }

        let record = match self.podcasts.get(podcast_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(podcast_id = %podcast_id, error = %e, "Failed to load podcast record");
                return None;
            }
        };

        let audio = match record.audio_url.as_deref() {
            Some(url) => self.load_asset(url, AssetKind::Audio).await,
            None => None,
        };
        let cover_image = match record.cover_image_url.as_deref() {
            Some(url) => self.load_asset(url, AssetKind::Image).await,
            None => None,
        };
        let transcript = match record.transcript_url.as_deref() {
            Some(url) => self.load_asset(url, AssetKind::Transcript).await,
            None => None,
        };

        Some(OfflinePodcast {
            record,
            audio,
            cover_image,
            transcript,
        })
    }

    /// Load a podcast for playback through the most-recent-wins gate: if a
    /// newer playback request arrives while this one resolves, the completed
    /// result is discarded instead of committed.
    #[instrument(skip(self))]
    pub async fn load_for_playback(&self, podcast_id: &str) -> Option<OfflinePodcast> {
        let ticket = self.gate.issue();
        let loaded = self.load_from_storage(podcast_id).await;

        if !ticket.is_current() {
            debug!(podcast_id = %podcast_id, "Discarding superseded playback resolution");
            return None;
        }
        loaded
    }

    /// Delete a record and cascade to its assets. An asset is removed only
    /// when no other stored record references the same URL.
    #[instrument(skip(self))]
    pub async fn delete_from_storage(&self, podcast_id: &str) -> bool {
        if podcast_id.is_empty() {
            return false;
        }

        let record = match self.podcasts.get(podcast_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                warn!(podcast_id = %podcast_id, error = %e, "Failed to load record for deletion");
                return false;
            }
        };

        match self.podcasts.delete(podcast_id).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!(podcast_id = %podcast_id, error = %e, "Failed to delete podcast record");
                return false;
            }
        }

        let remaining = match self.podcasts.get_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to scan for shared assets, skipping asset cleanup");
                Vec::new()
            }
        };

        for (_, url) in record.asset_urls() {
            let shared = remaining.iter().any(|other| other.references_asset(url));
            if shared {
                debug!(url = %url, "Asset still referenced by another record, keeping");
                continue;
            }
            if let Err(e) = self.assets.delete(url).await {
                warn!(url = %url, error = %e, "Failed to delete asset");
            }
        }

        info!(podcast_id = %podcast_id, "Podcast removed from offline storage");
        true
    }

    /// All records saved for offline use (filtered client-side).
    #[instrument(skip(self))]
    pub async fn get_all_saved(&self) -> Vec<PodcastRecord> {
        match self.podcasts.get_all().await {
            Ok(records) => records.into_iter().filter(|r| r.saved_offline).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to list saved podcasts");
                Vec::new()
            }
        }
    }

    /// Whether a stored asset may be served without re-downloading.
    fn servable(&self, asset: &CachedAsset) -> bool {
        if !asset.is_fresh(self.config.asset_max_age) {
            debug!(url = %asset.url, "Stored asset is stale");
            return false;
        }
        if self.config.verify_integrity && !asset.verify() {
            warn!(url = %asset.url, "Stored asset failed integrity check");
            return false;
        }
        true
    }

    /// Download an asset and persist it. Returns `None` on any failure.
    async fn download_asset(&self, url: &str, kind: AssetKind) -> Option<CachedAsset> {
        let request = HttpRequest::get(url)
            .mode(RequestMode::Cors)
            .timeout(self.config.fetch_timeout);

        let response = match self.fetch.fetch(request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(url = %url, status = response.status, "Asset download returned non-success");
                return None;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Asset download failed");
                return None;
            }
        };

        let content_type = response
            .content_type()
            .unwrap_or(kind.fallback_content_type())
            .to_string();
        let asset = CachedAsset::new(url, kind, content_type, response.body.clone());

        if let Err(e) = self.assets.put(&asset).await {
            warn!(url = %url, error = %e, "Failed to persist downloaded asset");
            // The bytes are still good for this caller even if persistence
            // failed.
        }

        Some(asset)
    }
}
