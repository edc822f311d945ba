//! # Core Runtime
//!
//! Ambient infrastructure shared by the offline core:
//!
//! - [`events`] - typed event bus broadcasting offline events to every
//!   subscribed application surface
//! - [`config`] - dependency-injected capability context with fail-fast
//!   validation
//! - [`logging`] - `tracing` subscriber initialization with env-filter and
//!   pretty/compact/JSON output
//! - [`error`] - runtime error type
//!
//! The event bus replaces ad-hoc global flags and window-attached callbacks:
//! components publish typed events and surfaces subscribe to exactly what
//! they need.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{EventBus, LibraryEvent, OfflineEvent, RecoveryEvent, WorkerEvent};
