//! Native SQLite Database Adapter
//!
//! Implements the `DatabaseAdapter` trait using `sqlx` with the native SQLite
//! driver.
//!
//! ## Features
//!
//! - Connection pooling with configurable limits
//! - WAL mode for better concurrency
//! - Foreign key enforcement
//! - Atomic batch execution via transactions

use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, DatabaseConfig, QueryRow, QueryValue};
use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Column, Pool, Row, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Native SQLite implementation of DatabaseAdapter
///
/// Wraps a `sqlx::Pool<Sqlite>` and implements all database operations using
/// the native SQLite driver.
pub struct SqliteAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteAdapter {
    /// Create a new SqliteAdapter with the given configuration
    ///
    /// # Errors
    ///
    /// Returns error if connection pool creation fails
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        info!(
            database_url = %config.database_url,
            min_connections = config.min_connections,
            max_connections = config.max_connections,
            "Creating SQLite database adapter"
        );

        let mut connect_options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| BridgeError::DatabaseError(format!("Invalid database URL: {}", e)))?;

        connect_options = connect_options
            // WAL mode: readers don't block the writer
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create connection pool");
                BridgeError::DatabaseError(format!("Connection pool creation failed: {}", e))
            })?;

        info!(
            connections = pool.size(),
            "SQLite connection pool created successfully"
        );

        Ok(Self { pool })
    }

    /// Create a new SqliteAdapter from an existing pool
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Convert a sqlx Row to a QueryRow (HashMap)
    fn row_to_query_row(row: &sqlx::sqlite::SqliteRow) -> QueryRow {
        let mut result = HashMap::new();

        for column in row.columns() {
            let column_name = column.name().to_string();

            // Try to get the value as different types
            let value = if let Ok(v) = row.try_get::<Option<i64>, _>(column.ordinal()) {
                v.map(QueryValue::Integer).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(column.ordinal()) {
                v.map(QueryValue::Real).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<String>, _>(column.ordinal()) {
                v.map(QueryValue::Text).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(column.ordinal()) {
                v.map(QueryValue::Blob).unwrap_or(QueryValue::Null)
            } else {
                QueryValue::Null
            };

            result.insert(column_name, value);
        }

        result
    }

    /// Convert QueryValue parameters to sqlx-compatible format
    fn bind_params<'q>(
        query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        params: &'q [QueryValue],
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        let mut query = query;
        for param in params {
            query = match param {
                QueryValue::Null => query.bind(None::<i64>),
                QueryValue::Integer(i) => query.bind(i),
                QueryValue::Real(r) => query.bind(r),
                QueryValue::Text(s) => query.bind(s.as_str()),
                QueryValue::Blob(b) => query.bind(b.as_slice()),
            };
        }
        query
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    async fn query(&self, query: &str, params: &[QueryValue]) -> Result<Vec<QueryRow>> {
        debug!(query = %query, param_count = params.len(), "Executing query");

        let sqlx_query = sqlx::query(query);
        let sqlx_query = Self::bind_params(sqlx_query, params);

        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query failed: {}", e)))?;

        let result: Vec<QueryRow> = rows.iter().map(Self::row_to_query_row).collect();

        debug!(row_count = result.len(), "Query executed successfully");
        Ok(result)
    }

    async fn execute(&self, statement: &str, params: &[QueryValue]) -> Result<u64> {
        debug!(statement = %statement, param_count = params.len(), "Executing statement");

        let sqlx_query = sqlx::query(statement);
        let sqlx_query = Self::bind_params(sqlx_query, params);

        let result = sqlx_query
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Execute failed: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn query_one_optional(
        &self,
        query: &str,
        params: &[QueryValue],
    ) -> Result<Option<QueryRow>> {
        debug!(query = %query, param_count = params.len(), "Executing query_one_optional");

        let sqlx_query = sqlx::query(query);
        let sqlx_query = Self::bind_params(sqlx_query, params);

        let row = sqlx_query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query one optional failed: {}", e)))?;

        Ok(row.as_ref().map(Self::row_to_query_row))
    }

    async fn execute_batch(&self, statements: &[(&str, &[QueryValue])]) -> Result<Vec<u64>> {
        debug!(statement_count = statements.len(), "Executing batch");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Begin batch failed: {}", e)))?;

        let mut counts = Vec::with_capacity(statements.len());

        for (statement, params) in statements {
            let sqlx_query = sqlx::query(statement);
            let sqlx_query = Self::bind_params(sqlx_query, params);

            let result = sqlx_query.execute(&mut *tx).await.map_err(|e| {
                BridgeError::DatabaseError(format!("Batch statement failed: {}", e))
            })?;

            counts.push(result.rows_affected());
        }

        tx.commit()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Commit batch failed: {}", e)))?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_adapter() -> SqliteAdapter {
        SqliteAdapter::new(DatabaseConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_table_and_roundtrip() {
        let adapter = memory_adapter().await;

        adapter
            .execute(
                "CREATE TABLE items (id TEXT PRIMARY KEY, size INTEGER, payload BLOB)",
                &[],
            )
            .await
            .unwrap();

        let affected = adapter
            .execute(
                "INSERT INTO items (id, size, payload) VALUES (?, ?, ?)",
                &[
                    QueryValue::Text("a".to_string()),
                    QueryValue::Integer(3),
                    QueryValue::Blob(vec![1, 2, 3]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let row = adapter
            .query_one_optional(
                "SELECT * FROM items WHERE id = ?",
                &[QueryValue::Text("a".to_string())],
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row.get("id").and_then(|v| v.as_string()), Some("a".into()));
        assert_eq!(row.get("size").and_then(|v| v.as_i64()), Some(3));
        assert_eq!(
            row.get("payload").and_then(|v| v.as_bytes()),
            Some(&[1u8, 2, 3][..])
        );
    }

    #[tokio::test]
    async fn test_query_one_optional_missing_row() {
        let adapter = memory_adapter().await;
        adapter
            .execute("CREATE TABLE items (id TEXT PRIMARY KEY)", &[])
            .await
            .unwrap();

        let row = adapter
            .query_one_optional(
                "SELECT * FROM items WHERE id = ?",
                &[QueryValue::Text("missing".to_string())],
            )
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_execute_batch_is_atomic() {
        let adapter = memory_adapter().await;
        adapter
            .execute("CREATE TABLE items (id TEXT PRIMARY KEY)", &[])
            .await
            .unwrap();

        // Second statement violates the primary key; the first must roll back.
        let result = adapter
            .execute_batch(&[
                (
                    "INSERT INTO items (id) VALUES (?)",
                    &[QueryValue::Text("x".to_string())][..],
                ),
                (
                    "INSERT INTO items (id) VALUES (?)",
                    &[QueryValue::Text("x".to_string())][..],
                ),
            ])
            .await;
        assert!(result.is_err());

        let rows = adapter.query("SELECT * FROM items", &[]).await.unwrap();
        assert!(rows.is_empty());
    }
}
