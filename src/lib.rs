//! Workspace facade crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-offline`, `core-runtime`, `bridge-native`).
//! Host applications can depend on `briefcast-core` and enable the documented
//! features without needing to wire each crate individually.

#[cfg(feature = "offline-core")]
pub use core_offline;
#[cfg(feature = "offline-core")]
pub use core_runtime;

#[cfg(feature = "native")]
pub use bridge_native;
