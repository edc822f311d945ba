//! # Worker Registry
//!
//! Registration handshake between the foreground application and the
//! background worker:
//!
//! - `register()` is idempotent: an existing live worker is returned, never
//!   duplicated
//! - lifecycle state changes are observable through a watch channel
//! - a registered worker stuck in the Waiting state is signalled to skip its
//!   wait and take over immediately
//! - `cache_podcast` round-trips are acknowledged, bounded by the configured
//!   timeout so a silent worker cannot hang the caller

use std::sync::Arc;

use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream, OfflineEvent, Receiver, WorkerEvent};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::OfflineConfig;
use crate::error::{OfflineError, Result};
use crate::protocol::{PodcastManifest, WorkerCommand};
use crate::worker::{OfflineWorker, WorkerState};

/// Capacity of the worker command channel.
const COMMAND_BUFFER: usize = 32;

/// Cloneable handle to a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    commands: mpsc::Sender<WorkerCommand>,
    events: EventBus,
    state: watch::Receiver<WorkerState>,
    ack_timeout: std::time::Duration,
}

impl WorkerHandle {
    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Whether the worker can still receive commands.
    pub fn is_live(&self) -> bool {
        !self.commands.is_closed() && self.state() != WorkerState::Stopped
    }

    /// Subscribe to worker/library/recovery broadcasts.
    pub fn subscribe(&self) -> Receiver<OfflineEvent> {
        self.events.subscribe()
    }

    /// Wait until the worker reports the Activated state.
    pub async fn wait_until_active(&self) -> Result<()> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| *s == WorkerState::Activated)
            .await
            .map(|_| ())
            .map_err(|_| {
                OfflineError::WorkerUnavailable("worker exited before activation".to_string())
            })
    }

    /// Signal the worker to activate immediately instead of waiting.
    pub async fn skip_waiting(&self) -> Result<()> {
        self.send(WorkerCommand::SkipWaiting).await
    }

    /// Request prefetch of a podcast's assets and await the matching
    /// `PodcastCached` broadcast, bounded by the acknowledgement timeout.
    #[instrument(skip(self, manifest), fields(podcast_id = %manifest.id))]
    pub async fn cache_podcast(&self, manifest: PodcastManifest) -> Result<()> {
        manifest.validate()?;
        let podcast_id = manifest.id.clone();

        // Subscribe before sending so the acknowledgement cannot slip
        // through between send and listen.
        let mut acks = EventStream::new(self.events.subscribe()).filter(move |event| {
            matches!(
                event,
                OfflineEvent::Worker(WorkerEvent::PodcastCached { podcast_id: id })
                    if *id == podcast_id
            )
        });

        self.send(WorkerCommand::CachePodcast { podcast: manifest })
            .await?;

        match timeout(self.ack_timeout, acks.recv()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(OfflineError::WorkerUnavailable(
                "event bus closed while awaiting acknowledgement".to_string(),
            )),
            Err(_) => Err(OfflineError::AckTimeout(self.ack_timeout)),
        }
    }

    /// Request removal of a podcast's metadata entry and listed assets.
    /// Completion is broadcast as `PodcastRemoved`.
    #[instrument(skip(self, asset_urls), fields(podcast_id = %podcast_id))]
    pub async fn remove_podcast(&self, podcast_id: &str, asset_urls: Vec<String>) -> Result<()> {
        let command = WorkerCommand::RemoveCachedPodcast {
            podcast_id: podcast_id.to_string(),
            asset_urls,
        };
        command.validate()?;
        self.send(command).await
    }

    /// Decode a wire message and dispatch it. Malformed messages surface as
    /// typed protocol errors rather than being dropped.
    pub async fn dispatch_json(&self, json: &str) -> Result<()> {
        let command = WorkerCommand::from_json(json)?;
        self.send(command).await
    }

    async fn send(&self, command: WorkerCommand) -> Result<()> {
        self.commands.send(command).await.map_err(|_| {
            OfflineError::WorkerUnavailable("worker command channel closed".to_string())
        })
    }
}

/// Spawns and tracks the background worker.
pub struct WorkerRegistry {
    config: OfflineConfig,
    core: CoreConfig,
    handle: Mutex<Option<WorkerHandle>>,
}

impl WorkerRegistry {
    pub fn new(config: OfflineConfig, core: CoreConfig) -> Self {
        Self {
            config,
            core,
            handle: Mutex::new(None),
        }
    }

    /// Register the background worker, idempotently.
    ///
    /// An existing live worker is returned as-is; if it is holding in the
    /// Waiting state, it is signalled to skip its wait so the newest version
    /// takes over immediately. A stopped or missing worker is (re)spawned.
    #[instrument(skip(self))]
    pub async fn register(&self) -> Result<WorkerHandle> {
        let mut slot = self.handle.lock().await;

        if let Some(handle) = slot.as_ref() {
            if handle.is_live() {
                debug!("Reusing existing worker registration");
                if handle.state() == WorkerState::Waiting {
                    info!("Existing worker is waiting, signalling skip-waiting");
                    handle.skip_waiting().await.ok();
                }
                return Ok(handle.clone());
            }
            warn!("Previous worker stopped, re-registering");
        }

        self.config
            .validate()
            .map_err(OfflineError::Internal)?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(WorkerState::Installing);

        let worker = OfflineWorker::new(
            self.config.clone(),
            Arc::clone(&self.core.cache_storage),
            Arc::clone(&self.core.fetch_client),
            self.core.events.clone(),
            state_tx,
            command_rx,
        );
        tokio::spawn(worker.run());

        let handle = WorkerHandle {
            commands: command_tx,
            events: self.core.events.clone(),
            state: state_rx,
            ack_timeout: self.config.ack_timeout,
        };

        info!("Background worker registered");
        *slot = Some(handle.clone());
        Ok(handle)
    }
}
