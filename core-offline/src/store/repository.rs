//! Database repositories for the structured asset store
//!
//! Persist podcast records and asset blobs through the `DatabaseAdapter`
//! trait so the same code runs over any durable engine the host provides.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bytes::Bytes;
use tracing::{debug, error, instrument};

use crate::error::{OfflineError, Result};
use crate::store::models::{AssetKind, CachedAsset, PodcastRecord};

// ============================================================================
// Traits
// ============================================================================

/// Repository for podcast records, keyed by podcast id.
#[async_trait]
pub trait PodcastStore: Send + Sync {
    /// Create tables if needed.
    async fn initialize(&self) -> Result<()>;

    /// Upsert by primary key; last-write-wins, no versioning or merge.
    async fn put(&self, record: &PodcastRecord) -> Result<()>;

    /// Fetch a record by id; `Ok(None)` when absent.
    async fn get(&self, id: &str) -> Result<Option<PodcastRecord>>;

    /// All stored records.
    async fn get_all(&self) -> Result<Vec<PodcastRecord>>;

    /// Idempotent delete; returns whether a record existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Repository for binary assets, keyed by source URL.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Create tables if needed.
    async fn initialize(&self) -> Result<()>;

    /// Upsert by URL; overwrites the prior copy and refreshes `stored_at`.
    async fn put(&self, asset: &CachedAsset) -> Result<()>;

    /// Fetch an asset by URL; `Ok(None)` when absent.
    async fn get(&self, url: &str) -> Result<Option<CachedAsset>>;

    /// Idempotent delete; returns whether an asset existed.
    async fn delete(&self, url: &str) -> Result<bool>;
}

// ============================================================================
// SQLite implementations
// ============================================================================

/// SQLite implementation of [`PodcastStore`].
pub struct SqlitePodcastStore {
    db: Arc<dyn DatabaseAdapter>,
}

impl SqlitePodcastStore {
    pub fn new(db: Arc<dyn DatabaseAdapter>) -> Self {
        Self { db }
    }

    fn row_to_record(row: &QueryRow) -> Result<PodcastRecord> {
        let extra_json = get_optional_string(row, "extra")?;
        let extra = match extra_json {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                OfflineError::Store(format!("Invalid extra field JSON: {}", e))
            })?,
            None => serde_json::Map::new(),
        };

        Ok(PodcastRecord {
            id: get_string(row, "id")?,
            title: get_optional_string(row, "title")?,
            audio_url: get_optional_string(row, "audio_url")?,
            cover_image_url: get_optional_string(row, "cover_image_url")?,
            transcript_url: get_optional_string(row, "transcript_url")?,
            saved_offline: get_i64(row, "saved_offline")? != 0,
            saved_at: get_i64(row, "saved_at")?,
            extra,
        })
    }
}

#[async_trait]
impl PodcastStore for SqlitePodcastStore {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<()> {
        debug!("Initializing podcast store");

        let statements = [
            (
                "CREATE TABLE IF NOT EXISTS podcasts (
                    id TEXT PRIMARY KEY NOT NULL,
                    title TEXT,
                    audio_url TEXT,
                    cover_image_url TEXT,
                    transcript_url TEXT,
                    saved_offline INTEGER NOT NULL DEFAULT 0,
                    saved_at INTEGER NOT NULL,
                    extra TEXT
                )",
                &[] as &[QueryValue],
            ),
            (
                "CREATE INDEX IF NOT EXISTS idx_podcasts_saved ON podcasts(saved_offline)",
                &[],
            ),
        ];

        self.db.execute_batch(&statements).await.map_err(|e| {
            error!("Failed to create podcasts table: {}", e);
            OfflineError::Store(format!("Failed to initialize podcast store: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn put(&self, record: &PodcastRecord) -> Result<()> {
        let sql = r#"
            INSERT OR REPLACE INTO podcasts (
                id, title, audio_url, cover_image_url, transcript_url,
                saved_offline, saved_at, extra
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let extra = serde_json::to_string(&record.extra)
            .map_err(|e| OfflineError::Store(format!("Failed to encode extra fields: {}", e)))?;

        let params = vec![
            QueryValue::Text(record.id.clone()),
            optional_text(&record.title),
            optional_text(&record.audio_url),
            optional_text(&record.cover_image_url),
            optional_text(&record.transcript_url),
            QueryValue::Integer(if record.saved_offline { 1 } else { 0 }),
            QueryValue::Integer(record.saved_at),
            QueryValue::Text(extra),
        ];

        self.db.execute(sql, &params).await.map_err(|e| {
            error!("Failed to upsert podcast record: {}", e);
            OfflineError::Store(format!("Failed to upsert podcast record: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<PodcastRecord>> {
        let sql = "SELECT * FROM podcasts WHERE id = ?";
        let params = vec![QueryValue::Text(id.to_string())];

        let row = self.db.query_one_optional(sql, &params).await.map_err(|e| {
            error!("Failed to query podcast record: {}", e);
            OfflineError::Store(format!("Failed to query podcast record: {}", e))
        })?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<PodcastRecord>> {
        let sql = "SELECT * FROM podcasts";

        let rows = self.db.query(sql, &[]).await.map_err(|e| {
            error!("Failed to query podcast records: {}", e);
            OfflineError::Store(format!("Failed to query podcast records: {}", e))
        })?;

        rows.iter().map(Self::row_to_record).collect()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let sql = "DELETE FROM podcasts WHERE id = ?";
        let params = vec![QueryValue::Text(id.to_string())];

        let affected = self.db.execute(sql, &params).await.map_err(|e| {
            error!("Failed to delete podcast record: {}", e);
            OfflineError::Store(format!("Failed to delete podcast record: {}", e))
        })?;

        Ok(affected > 0)
    }
}

/// SQLite implementation of [`AssetStore`]. Blobs live in a BLOB column of
/// the assets table; there is no side filesystem.
pub struct SqliteAssetStore {
    db: Arc<dyn DatabaseAdapter>,
}

impl SqliteAssetStore {
    pub fn new(db: Arc<dyn DatabaseAdapter>) -> Self {
        Self { db }
    }

    fn row_to_asset(row: &QueryRow) -> Result<CachedAsset> {
        let kind_str = get_string(row, "kind")?;
        let kind = AssetKind::parse(&kind_str)
            .ok_or_else(|| OfflineError::Store(format!("Unknown asset kind: {}", kind_str)))?;

        let body = row
            .get("body")
            .and_then(|v| v.as_bytes())
            .map(|b| Bytes::copy_from_slice(b))
            .ok_or_else(|| OfflineError::Store("Missing column: body".to_string()))?;

        Ok(CachedAsset {
            url: get_string(row, "url")?,
            kind,
            content_type: get_string(row, "content_type")?,
            body,
            content_hash: get_string(row, "content_hash")?,
            stored_at: get_i64(row, "stored_at")?,
        })
    }
}

#[async_trait]
impl AssetStore for SqliteAssetStore {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<()> {
        debug!("Initializing asset store");

        let statements = [
            (
                "CREATE TABLE IF NOT EXISTS assets (
                    url TEXT PRIMARY KEY NOT NULL,
                    kind TEXT NOT NULL,
                    content_type TEXT NOT NULL,
                    body BLOB NOT NULL,
                    content_hash TEXT NOT NULL,
                    stored_at INTEGER NOT NULL
                )",
                &[] as &[QueryValue],
            ),
            (
                "CREATE INDEX IF NOT EXISTS idx_assets_stored_at ON assets(stored_at)",
                &[],
            ),
        ];

        self.db.execute_batch(&statements).await.map_err(|e| {
            error!("Failed to create assets table: {}", e);
            OfflineError::Store(format!("Failed to initialize asset store: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self, asset), fields(url = %asset.url))]
    async fn put(&self, asset: &CachedAsset) -> Result<()> {
        let sql = r#"
            INSERT OR REPLACE INTO assets (
                url, kind, content_type, body, content_hash, stored_at
            ) VALUES (?, ?, ?, ?, ?, ?)
        "#;

        let params = vec![
            QueryValue::Text(asset.url.clone()),
            QueryValue::Text(asset.kind.as_str().to_string()),
            QueryValue::Text(asset.content_type.clone()),
            QueryValue::Blob(asset.body.to_vec()),
            QueryValue::Text(asset.content_hash.clone()),
            QueryValue::Integer(asset.stored_at),
        ];

        self.db.execute(sql, &params).await.map_err(|e| {
            error!("Failed to upsert asset: {}", e);
            OfflineError::Store(format!("Failed to upsert asset: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<Option<CachedAsset>> {
        let sql = "SELECT * FROM assets WHERE url = ?";
        let params = vec![QueryValue::Text(url.to_string())];

        let row = self.db.query_one_optional(sql, &params).await.map_err(|e| {
            error!("Failed to query asset: {}", e);
            OfflineError::Store(format!("Failed to query asset: {}", e))
        })?;

        row.as_ref().map(Self::row_to_asset).transpose()
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<bool> {
        let sql = "DELETE FROM assets WHERE url = ?";
        let params = vec![QueryValue::Text(url.to_string())];

        let affected = self.db.execute(sql, &params).await.map_err(|e| {
            error!("Failed to delete asset: {}", e);
            OfflineError::Store(format!("Failed to delete asset: {}", e))
        })?;

        Ok(affected > 0)
    }
}

// ============================================================================
// Helper functions for extracting values from QueryRow
// ============================================================================

fn get_string(row: &QueryRow, key: &str) -> Result<String> {
    row.get(key)
        .and_then(|value| value.as_string())
        .ok_or_else(|| OfflineError::Store(format!("Missing column: {}", key)))
}

fn get_optional_string(row: &QueryRow, key: &str) -> Result<Option<String>> {
    Ok(match row.get(key) {
        Some(QueryValue::Null) | None => None,
        Some(value) => Some(value.as_string().ok_or_else(|| {
            OfflineError::Store(format!("Invalid type for column: {}", key))
        })?),
    })
}

fn get_i64(row: &QueryRow, key: &str) -> Result<i64> {
    row.get(key)
        .and_then(|value| value.as_i64())
        .ok_or_else(|| OfflineError::Store(format!("Missing column: {}", key)))
}

fn optional_text(value: &Option<String>) -> QueryValue {
    value
        .as_ref()
        .map(|s| QueryValue::Text(s.clone()))
        .unwrap_or(QueryValue::Null)
}
