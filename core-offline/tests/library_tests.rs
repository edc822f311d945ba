//! Integration tests for the offline library facade
//!
//! Runs the facade against a real in-memory SQLite store and a scripted
//! fetch client, covering save/load/delete flows, partial failures, and the
//! most-recent-wins playback gate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_native::SqliteAdapter;
use bridge_traits::database::{DatabaseAdapter, DatabaseConfig};
use bridge_traits::http::{FetchClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_offline::store::{
    AssetKind, AssetStore, CachedAsset, OfflineLibrary, ResolvedAsset, SqliteAssetStore,
    SqlitePodcastStore,
};
use core_offline::{OfflineConfig, PodcastManifest};
use core_runtime::events::{EventBus, LibraryEvent, OfflineEvent};

/// Scripted fetch client: URLs listed in `bodies` succeed, everything else
/// fails like a dead network. Counts calls per URL.
struct ScriptedFetch {
    bodies: HashMap<String, (&'static str, &'static str)>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedFetch {
    fn new(bodies: &[(&str, &'static str, &'static str)]) -> Self {
        Self {
            bodies: bodies
                .iter()
                .map(|(url, ct, body)| (url.to_string(), (*ct, *body)))
                .collect(),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchClient for ScriptedFetch {
    async fn fetch(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.bodies.get(&request.url) {
            Some((content_type, body)) => {
                let mut headers = HashMap::new();
                headers.insert("content-type".to_string(), content_type.to_string());
                Ok(HttpResponse {
                    status: 200,
                    headers,
                    body: Bytes::from(*body),
                })
            }
            None => Err(bridge_traits::BridgeError::OperationFailed(
                "Connection failed".to_string(),
            )),
        }
    }
}

async fn library_with(
    config: OfflineConfig,
    fetch: Arc<ScriptedFetch>,
) -> (Arc<OfflineLibrary>, EventBus) {
    let adapter: Arc<dyn DatabaseAdapter> = Arc::new(
        SqliteAdapter::new(DatabaseConfig::in_memory())
            .await
            .unwrap(),
    );
    let podcasts = Arc::new(SqlitePodcastStore::new(Arc::clone(&adapter)));
    let assets = Arc::new(SqliteAssetStore::new(adapter));
    let events = EventBus::new(100);

    let library = Arc::new(OfflineLibrary::new(
        config,
        podcasts,
        assets,
        fetch,
        events.clone(),
    ));
    library.initialize().await.unwrap();
    (library, events)
}

fn full_manifest(id: &str) -> PodcastManifest {
    let mut manifest = PodcastManifest::with_id(id);
    manifest.title = Some("Morning Brief".to_string());
    manifest.audio_url = Some("https://x/a.mp3".to_string());
    manifest.cover_image_url = Some("https://x/c.png".to_string());
    manifest.transcript_url = Some("https://x/t.lrc".to_string());
    manifest
}

const ALL_ASSETS: &[(&str, &'static str, &'static str)] = &[
    ("https://x/a.mp3", "audio/mpeg", "audio-bytes"),
    ("https://x/c.png", "image/png", "cover-bytes"),
    ("https://x/t.lrc", "text/plain", "transcript-bytes"),
];

#[tokio::test]
async fn save_offline_stores_record_and_assets() {
    let fetch = Arc::new(ScriptedFetch::new(ALL_ASSETS));
    let (library, events) = library_with(OfflineConfig::default(), Arc::clone(&fetch)).await;
    let mut subscription = events.subscribe();

    assert!(!library.is_available_offline("p1").await);
    assert!(library.save_offline(&full_manifest("p1")).await);

    assert!(library.is_available_offline("p1").await);
    let saved = library.get_all_saved().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, "p1");
    assert_eq!(fetch.call_count(), 3);

    let event = subscription.recv().await.unwrap();
    assert_eq!(
        event,
        OfflineEvent::Library(LibraryEvent::CachingComplete {
            podcast_id: "p1".to_string(),
            failed_assets: 0,
        })
    );
}

#[tokio::test]
async fn save_offline_tolerates_partial_asset_failure() {
    // Transcript URL is not scripted, so its download fails.
    let fetch = Arc::new(ScriptedFetch::new(&ALL_ASSETS[..2]));
    let (library, events) = library_with(OfflineConfig::default(), fetch).await;
    let mut subscription = events.subscribe();

    assert!(library.save_offline(&full_manifest("p1")).await);
    assert!(library.is_available_offline("p1").await);

    let event = subscription.recv().await.unwrap();
    assert_eq!(
        event,
        OfflineEvent::Library(LibraryEvent::CachingComplete {
            podcast_id: "p1".to_string(),
            failed_assets: 1,
        })
    );
}

#[tokio::test]
async fn save_offline_rejects_invalid_manifest() {
    let fetch = Arc::new(ScriptedFetch::new(&[]));
    let (library, _events) = library_with(OfflineConfig::default(), Arc::clone(&fetch)).await;

    assert!(!library.save_offline(&PodcastManifest::with_id("  ")).await);
    assert_eq!(fetch.call_count(), 0);
}

#[tokio::test]
async fn load_asset_serves_stored_copy_without_refetching() {
    let fetch = Arc::new(ScriptedFetch::new(ALL_ASSETS));
    let (library, _events) = library_with(OfflineConfig::default(), Arc::clone(&fetch)).await;

    let first = library
        .load_asset("https://x/a.mp3", AssetKind::Audio)
        .await
        .unwrap();
    assert_eq!(
        first,
        ResolvedAsset::Local {
            body: Bytes::from("audio-bytes"),
            content_type: "audio/mpeg".to_string(),
        }
    );
    assert_eq!(fetch.call_count(), 1);

    // Second load hits the store, not the network.
    let second = library
        .load_asset("https://x/a.mp3", AssetKind::Audio)
        .await
        .unwrap();
    assert!(second.is_local());
    assert_eq!(fetch.call_count(), 1);
}

#[tokio::test]
async fn load_asset_redownloads_stale_copy() {
    // Zero max age: every stored copy is immediately stale.
    let config = OfflineConfig::default().with_asset_max_age(Duration::ZERO);
    let fetch = Arc::new(ScriptedFetch::new(ALL_ASSETS));
    let (library, _events) = library_with(config, Arc::clone(&fetch)).await;

    let _ = library.load_asset("https://x/a.mp3", AssetKind::Audio).await;
    let _ = library.load_asset("https://x/a.mp3", AssetKind::Audio).await;
    assert_eq!(fetch.call_count(), 2);
}

#[tokio::test]
async fn load_asset_falls_back_to_remote_url() {
    let fetch = Arc::new(ScriptedFetch::new(&[]));
    let (library, _events) = library_with(OfflineConfig::default(), fetch).await;

    let resolved = library
        .load_asset("https://x/missing.mp3", AssetKind::Audio)
        .await
        .unwrap();
    assert_eq!(
        resolved,
        ResolvedAsset::Remote {
            url: "https://x/missing.mp3".to_string(),
        }
    );

    assert!(library.load_asset("", AssetKind::Audio).await.is_none());
}

#[tokio::test]
async fn load_from_storage_resolves_all_assets() {
    let fetch = Arc::new(ScriptedFetch::new(ALL_ASSETS));
    let (library, _events) = library_with(OfflineConfig::default(), fetch).await;

    library.save_offline(&full_manifest("p1")).await;

    let loaded = library.load_from_storage("p1").await.unwrap();
    assert_eq!(loaded.record.id, "p1");
    assert!(loaded.audio.unwrap().is_local());
    assert!(loaded.cover_image.unwrap().is_local());
    assert!(loaded.transcript.unwrap().is_local());

    assert!(library.load_from_storage("missing").await.is_none());
}

#[tokio::test]
async fn delete_from_storage_cascades_to_exclusive_assets() {
    let fetch = Arc::new(ScriptedFetch::new(ALL_ASSETS));
    let (library, _events) = library_with(OfflineConfig::default(), Arc::clone(&fetch)).await;

    library.save_offline(&full_manifest("p1")).await;
    assert!(library.delete_from_storage("p1").await);

    assert!(!library.is_available_offline("p1").await);
    assert!(library.get_all_saved().await.is_empty());

    // Assets are gone from the store: resolving them again re-downloads.
    let calls_before = fetch.call_count();
    let _ = library.load_asset("https://x/a.mp3", AssetKind::Audio).await;
    assert_eq!(fetch.call_count(), calls_before + 1);

    // Deleting again is a no-op.
    assert!(!library.delete_from_storage("p1").await);
}

#[tokio::test]
async fn delete_keeps_assets_shared_with_other_records() {
    let fetch = Arc::new(ScriptedFetch::new(ALL_ASSETS));
    let (library, _events) = library_with(OfflineConfig::default(), Arc::clone(&fetch)).await;

    // Two episodes share the cover image URL.
    library.save_offline(&full_manifest("p1")).await;
    let mut second = PodcastManifest::with_id("p2");
    second.cover_image_url = Some("https://x/c.png".to_string());
    library.save_offline(&second).await;

    assert!(library.delete_from_storage("p1").await);

    // Shared cover stays cached: no refetch needed.
    let calls_before = fetch.call_count();
    let cover = library
        .load_asset("https://x/c.png", AssetKind::Image)
        .await
        .unwrap();
    assert!(cover.is_local());
    assert_eq!(fetch.call_count(), calls_before);

    // Exclusive audio was removed: resolving refetches.
    let _ = library.load_asset("https://x/a.mp3", AssetKind::Audio).await;
    assert_eq!(fetch.call_count(), calls_before + 1);
}

#[tokio::test]
async fn superseded_playback_request_is_discarded() {
    let fetch = Arc::new(
        ScriptedFetch::new(ALL_ASSETS).with_delay(Duration::from_millis(100)),
    );
    // Zero max age keeps every resolution on the slow download path, so the
    // two playback requests genuinely overlap.
    let config = OfflineConfig::default().with_asset_max_age(Duration::ZERO);
    let (library, _events) = library_with(config, fetch).await;
    library.save_offline(&full_manifest("p1")).await;

    let first = {
        let library = Arc::clone(&library);
        tokio::spawn(async move { library.load_for_playback("p1").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = library.load_for_playback("p1").await;

    // The older request completed but its result was discarded.
    assert!(first.await.unwrap().is_none());
    assert!(second.is_some());
}

#[tokio::test]
async fn corrupt_stored_asset_is_redownloaded() {
    let adapter: Arc<dyn DatabaseAdapter> = Arc::new(
        SqliteAdapter::new(DatabaseConfig::in_memory())
            .await
            .unwrap(),
    );
    let podcasts = Arc::new(SqlitePodcastStore::new(Arc::clone(&adapter)));
    let assets = Arc::new(SqliteAssetStore::new(adapter));
    let fetch = Arc::new(ScriptedFetch::new(ALL_ASSETS));
    let events = EventBus::new(100);

    let library = OfflineLibrary::new(
        OfflineConfig::default(),
        podcasts,
        Arc::clone(&assets) as Arc<dyn AssetStore>,
        Arc::clone(&fetch) as Arc<dyn FetchClient>,
        events,
    );
    library.initialize().await.unwrap();

    // A stored copy whose recorded hash no longer matches its body.
    let mut corrupt = CachedAsset::new(
        "https://x/a.mp3",
        AssetKind::Audio,
        "audio/mpeg",
        Bytes::from("good"),
    );
    corrupt.body = Bytes::from("bit-rotted");
    assets.put(&corrupt).await.unwrap();

    // Resolution refuses the corrupt bytes and downloads a clean copy.
    let resolved = library
        .load_asset("https://x/a.mp3", AssetKind::Audio)
        .await
        .unwrap();
    assert_eq!(
        resolved,
        ResolvedAsset::Local {
            body: Bytes::from("audio-bytes"),
            content_type: "audio/mpeg".to_string(),
        }
    );
    assert_eq!(fetch.call_count(), 1);
}
