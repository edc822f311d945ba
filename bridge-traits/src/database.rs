//! Database Abstraction Layer
//!
//! Provides a platform-agnostic trait for the durable structured-storage
//! facility backing podcast records and cached asset blobs. Implementations
//! wrap whatever engine the host provides (SQLite on native, an embedded
//! store elsewhere); the core only speaks parameterized SQL through it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration for cross-platform initialization
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path or connection string
    pub database_url: String,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Create a new database configuration with the given file path
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        let database_url = format!("sqlite:{}", path.display());

        Self {
            database_url,
            min_connections: 1,
            max_connections: 5,
            acquire_timeout_secs: 30,
        }
    }

    /// Create a configuration for an in-memory database
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

// =============================================================================
// Query Result Types
// =============================================================================

/// Represents a single row from a database query as a map of column names to values
pub type QueryRow = std::collections::HashMap<String, QueryValue>;

/// Represents a database value that can be null, integer, real, text, or blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl QueryValue {
    /// Convert to i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            QueryValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to f64 if possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            QueryValue::Real(r) => Some(*r),
            QueryValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert to String if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert to String (owned) if possible
    pub fn as_string(&self) -> Option<String> {
        match self {
            QueryValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Convert to bytes if possible
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            QueryValue::Blob(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }
}

// =============================================================================
// Database Adapter Trait
// =============================================================================

/// Database adapter trait for durable structured storage
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the store repositories share one
/// adapter across concurrent request handlers.
///
/// ## Safety
///
/// Methods take parameterized queries; user input must never be concatenated
/// into the query string.
#[async_trait::async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Execute a raw SQL query and return rows
    ///
    /// # Arguments
    ///
    /// * `query` - SQL query string
    /// * `params` - Query parameters (positional)
    async fn query(&self, query: &str, params: &[QueryValue]) -> Result<Vec<QueryRow>>;

    /// Execute a SQL statement that doesn't return rows (INSERT, UPDATE, DELETE)
    ///
    /// # Returns
    ///
    /// Number of rows affected
    async fn execute(&self, statement: &str, params: &[QueryValue]) -> Result<u64>;

    /// Execute a query and return a single optional row
    ///
    /// This is a convenience method for queries that return 0 or 1 rows.
    async fn query_one_optional(
        &self,
        query: &str,
        params: &[QueryValue],
    ) -> Result<Option<QueryRow>>;

    /// Execute multiple statements in a batch (more efficient than individual
    /// executes). The batch is atomic: if any statement fails, all are rolled
    /// back.
    ///
    /// # Returns
    ///
    /// Vector of row counts (one per statement)
    async fn execute_batch(&self, statements: &[(&str, &[QueryValue])]) -> Result<Vec<u64>>;
}
