//! # Structured Asset Store
//!
//! Durable persistence surviving application restarts, for two record
//! families: podcast records keyed by id and binary assets keyed by source
//! URL.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     OfflineLibrary (facade)            │
//! │  - save_offline()                      │
//! │  - is_available_offline()              │
//! │  - load_asset() / load_for_playback()  │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> PodcastStore  (records, DatabaseAdapter)
//!          ├──> AssetStore    (blobs, DatabaseAdapter)
//!          ├──> FetchClient   (downloads)
//!          └──> EventBus      (completion broadcasts)
//! ```
//!
//! Repositories return typed errors; the facade absorbs them into
//! `false`/`None`/empty results so storage failures never reach UI code as
//! unhandled errors.

pub mod library;
pub mod models;
pub mod repository;

pub use library::{OfflineLibrary, OfflinePodcast, ResolvedAsset};
pub use models::{AssetKind, CachedAsset, PodcastRecord};
pub use repository::{AssetStore, PodcastStore, SqliteAssetStore, SqlitePodcastStore};
