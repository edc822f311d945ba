//! Offline subsystem demonstration
//!
//! Wires the worker, interceptor, and offline library together against the
//! in-memory cache storage and an in-memory database, then walks through a
//! save-offline round trip.
//!
//! Run with:
//! ```bash
//! cargo run --example offline_demo
//! ```

use std::sync::Arc;

use anyhow::Result;
use bridge_native::{MemoryCacheStorage, ReqwestFetchClient, SqliteAdapter};
use bridge_traits::database::{DatabaseAdapter, DatabaseConfig};
use bridge_traits::http::HttpRequest;
use core_offline::store::{OfflineLibrary, SqliteAssetStore, SqlitePodcastStore};
use core_offline::{InterceptOutcome, OfflineConfig, PodcastManifest, RequestInterceptor, WorkerRegistry};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default()).expect("Failed to initialize logging");

    // Capabilities: real HTTP, in-memory caches, in-memory database.
    let core = CoreConfig::builder()
        .fetch_client(Arc::new(ReqwestFetchClient::new()))
        .cache_storage(Arc::new(MemoryCacheStorage::new()))
        .database(Arc::new(
            SqliteAdapter::new(DatabaseConfig::in_memory()).await?,
        ))
        .build()?;

    let config = OfflineConfig::default().with_origin("https://example.com");

    // Background worker: install (shell precache) + activate (cache GC).
    let registry = WorkerRegistry::new(config.clone(), core.clone());
    let worker = registry.register().await?;
    worker.wait_until_active().await?;
    info!("worker active");

    // Request interceptor in front of the network.
    let interceptor = RequestInterceptor::new(
        config.clone(),
        Arc::clone(&core.cache_storage),
        Arc::clone(&core.fetch_client),
    );
    match interceptor
        .handle(HttpRequest::get("https://example.com/").navigation())
        .await
    {
        InterceptOutcome::Response(response) => {
            info!(status = response.status, "navigation handled")
        }
        InterceptOutcome::Pass => info!("navigation passed through"),
    }

    // Offline library over the structured store.
    let database: Arc<dyn DatabaseAdapter> = Arc::clone(&core.database);
    let library = OfflineLibrary::new(
        config,
        Arc::new(SqlitePodcastStore::new(Arc::clone(&database))),
        Arc::new(SqliteAssetStore::new(database)),
        Arc::clone(&core.fetch_client),
        core.events.clone(),
    );
    library.initialize().await?;

    let mut manifest = PodcastManifest::with_id("demo-episode");
    manifest.title = Some("Demo Episode".to_string());
    manifest.cover_image_url = Some("https://example.com/favicon.ico".to_string());

    let saved = library.save_offline(&manifest).await;
    info!(saved, "save_offline finished");
    info!(
        available = library.is_available_offline("demo-episode").await,
        saved_count = library.get_all_saved().await.len(),
        "offline state"
    );

    Ok(())
}
