//! # Offline Core
//!
//! The offline caching subsystem of BriefCast: named versioned caches with
//! per-resource-class strategies, a request interceptor, a structured asset
//! store for offline playback, and the sync protocol between the foreground
//! application and the background worker.
//!
//! ## Components
//!
//! - [`routes`] - cache names and the ordered request-classification table
//! - [`interceptor`] - strategy execution for every intercepted request
//! - [`store`] - durable podcast records and asset blobs, plus the
//!   [`OfflineLibrary`](store::OfflineLibrary) facade the UI consumes
//! - [`protocol`] / [`worker`] / [`registry`] - typed command catalog, the
//!   background worker task, and the idempotent registration handshake
//! - [`recovery`] - stale-build detection and cache purge
//! - [`generation`] - most-recent-wins gate for playback requests
//!
//! ## Data flow
//!
//! ```text
//! application ──CachePodcast──> worker ──fetch──> network
//!      ▲                          │
//!      │                          ├──> named caches (audio/images/metadata)
//!      └──────PodcastCached───────┘
//! ```
//!
//! ## Failure policy
//!
//! The interceptor and the library facade never surface errors to their
//! callers: failed fetches become cached copies or synthesized responses,
//! storage failures become misses and no-ops. See
//! [`error::OfflineError`] for the taxonomy.

pub mod config;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod interceptor;
pub mod protocol;
pub mod recovery;
pub mod registry;
pub mod routes;
pub mod store;
pub mod worker;

pub use config::OfflineConfig;
pub use error::{OfflineError, Result};
pub use generation::{PlaybackGate, Ticket};
pub use interceptor::{InterceptOutcome, RequestInterceptor};
pub use protocol::{PodcastManifest, ProtocolError, WorkerCommand};
pub use recovery::{is_stale_chunk_failure, ChunkRecovery, ResourceFailure};
pub use registry::{WorkerHandle, WorkerRegistry};
pub use routes::{CacheName, RouteTable, Strategy};
pub use store::{AssetKind, OfflineLibrary, PodcastRecord};
pub use worker::WorkerState;
