//! Store record models

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::protocol::PodcastManifest;

/// The three podcast asset classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Audio,
    Image,
    Transcript,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Image => "image",
            AssetKind::Transcript => "transcript",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(AssetKind::Audio),
            "image" => Some(AssetKind::Image),
            "transcript" => Some(AssetKind::Transcript),
            _ => None,
        }
    }

    /// Content type assumed when a download does not declare one.
    pub fn fallback_content_type(self) -> &'static str {
        match self {
            AssetKind::Audio => "audio/mpeg",
            AssetKind::Image => "application/octet-stream",
            AssetKind::Transcript => "text/plain",
        }
    }
}

/// SHA-256 hash of a byte payload, hex-encoded.
pub(crate) fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// A binary resource keyed by its canonical source URL.
///
/// At most one stored copy exists per URL; re-storing overwrites the prior
/// copy and refreshes `stored_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    pub url: String,
    pub kind: AssetKind,
    pub content_type: String,
    pub body: Bytes,
    /// SHA-256 of `body`, computed at store time.
    pub content_hash: String,
    /// Unix timestamp (seconds) of the store.
    pub stored_at: i64,
}

impl CachedAsset {
    /// Build an asset from a freshly downloaded payload, hashing and
    /// timestamping it.
    pub fn new(
        url: impl Into<String>,
        kind: AssetKind,
        content_type: impl Into<String>,
        body: Bytes,
    ) -> Self {
        let hash = content_hash(&body);
        Self {
            url: url.into(),
            kind,
            content_type: content_type.into(),
            body,
            content_hash: hash,
            stored_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether the stored body still matches its recorded hash.
    pub fn verify(&self) -> bool {
        content_hash(&self.body) == self.content_hash
    }

    /// Whether the asset is younger than `max_age`.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        let age = chrono::Utc::now().timestamp() - self.stored_at;
        age >= 0 && (age as u64) < max_age.as_secs()
    }
}

/// Metadata describing an episode available for offline playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PodcastRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_url: Option<String>,
    pub saved_offline: bool,
    /// Unix timestamp (seconds) of the save.
    pub saved_at: i64,
    /// Descriptive fields (category, duration, slug, ...) carried opaquely.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PodcastRecord {
    /// Build the record stored by a save-offline operation.
    pub fn from_manifest(manifest: &PodcastManifest) -> Self {
        Self {
            id: manifest.id.clone(),
            title: manifest.title.clone(),
            audio_url: manifest.audio_url.clone(),
            cover_image_url: manifest.cover_image_url.clone(),
            transcript_url: manifest.transcript_url.clone(),
            saved_offline: true,
            saved_at: chrono::Utc::now().timestamp(),
            extra: manifest.extra.clone(),
        }
    }

    /// The asset URLs referenced by this record, with their kinds.
    pub fn asset_urls(&self) -> Vec<(AssetKind, &str)> {
        let mut urls = Vec::new();
        if let Some(url) = self.audio_url.as_deref() {
            urls.push((AssetKind::Audio, url));
        }
        if let Some(url) = self.cover_image_url.as_deref() {
            urls.push((AssetKind::Image, url));
        }
        if let Some(url) = self.transcript_url.as_deref() {
            urls.push((AssetKind::Transcript, url));
        }
        urls
    }

    /// Whether this record references the given asset URL.
    pub fn references_asset(&self, url: &str) -> bool {
        self.asset_urls().iter().any(|(_, u)| *u == url)
    }
}
