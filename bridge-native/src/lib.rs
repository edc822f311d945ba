//! # Native Bridge Implementations
//!
//! Concrete implementations of the `bridge-traits` seams for native hosts:
//!
//! - [`ReqwestFetchClient`](http::ReqwestFetchClient) - pooled HTTP client
//!   with retry and exponential backoff
//! - [`SqliteAdapter`](sqlite::SqliteAdapter) - `sqlx`-backed SQLite database
//!   adapter (WAL mode, pooled connections)
//! - [`MemoryCacheStorage`](memory::MemoryCacheStorage) - in-process named
//!   cache storage for embedding and tests

pub mod http;
pub mod memory;
pub mod sqlite;

pub use http::ReqwestFetchClient;
pub use memory::MemoryCacheStorage;
pub use sqlite::SqliteAdapter;
