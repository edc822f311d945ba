//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the offline core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be provided differently per host (native
//! service, embedded runtime, test harness).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`FetchClient`](http::FetchClient) - Async outbound fetch with retry and
//!   per-request mode/credentials control
//!
//! ### Storage
//! - [`CacheStorage`](storage::CacheStorage) - Named, versioned caches of
//!   request-identity → response-snapshot pairs
//! - [`DatabaseAdapter`](database::DatabaseAdapter) - Durable structured
//!   storage behind parameterized SQL
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing rather than degrading silently:
//!
//! ```ignore
//! let fetch = deps.fetch_client
//!     .ok_or_else(|| BridgeError::NotAvailable("FetchClient".into()))?;
//! ```
//!
//! ## Error Handling
//!
//! All trait methods return [`Result`](error::Result) over
//! [`BridgeError`](error::BridgeError); how a failure is absorbed (cache miss,
//! synthesized response, logged no-op) is policy that lives in the core, not
//! in the bridge.

pub mod database;
pub mod error;
pub mod http;
pub mod storage;

pub use error::{BridgeError, Result};
