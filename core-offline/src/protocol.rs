//! # Sync Protocol Messages
//!
//! Tagged-union message catalog between the foreground application and the
//! background worker. Every message kind carries a schema-validated payload
//! and is handled exhaustively; a malformed message is a typed error, never
//! a silent drop.
//!
//! Wire form is `{"type": ..., "payload": ...}` JSON for hosts that relay
//! messages across a serialization boundary; in-process callers construct
//! the enums directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::AssetKind;

/// Errors raised while decoding or validating protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The message was not valid JSON or did not match any known kind.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// The message was well-formed but its payload failed validation.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

// ============================================================================
// Payloads
// ============================================================================

/// Podcast description as received from the application: the server-assigned
/// id, the three asset references, and whatever descriptive fields the
/// backend attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PodcastManifest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_url: Option<String>,
    /// Descriptive fields (category, duration, slug, ...) passed through
    /// opaquely.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PodcastManifest {
    /// A manifest with only an id, for tests and minimal callers.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            audio_url: None,
            cover_image_url: None,
            transcript_url: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Validate the payload schema.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.id.trim().is_empty() {
            return Err(ProtocolError::InvalidPayload(
                "podcast id must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The asset URLs actually present on this manifest, with their kinds.
    /// Absent URLs are simply not fetched.
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
}

// ============================================================================
// Commands (page → worker)
// ============================================================================

/// Commands the foreground application sends to the background worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum WorkerCommand {
    /// Activate immediately instead of waiting for all surfaces to release
    /// the previous version.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,

    /// Prefetch every present asset of the podcast, store its metadata blob,
    /// and broadcast `PodcastCached` when done.
    #[serde(rename = "CACHE_PODCAST")]
    CachePodcast { podcast: PodcastManifest },

    /// Delete the podcast's metadata entry and each listed asset, then
    /// broadcast `PodcastRemoved`.
    #[serde(rename = "REMOVE_CACHED_PODCAST")]
    RemoveCachedPodcast {
        #[serde(rename = "podcastId")]
        podcast_id: String,
        #[serde(rename = "assetUrls", default)]
        asset_urls: Vec<String>,
    },
}

impl WorkerCommand {
    /// Decode a wire message, validating its payload.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let command: WorkerCommand = serde_json::from_str(json)
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        command.validate()?;
        Ok(command)
    }

    /// Validate the payload of an already-decoded command.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            WorkerCommand::SkipWaiting => Ok(()),
            WorkerCommand::CachePodcast { podcast } => podcast.validate(),
            WorkerCommand::RemoveCachedPodcast { podcast_id, .. } => {
                if podcast_id.trim().is_empty() {
                    Err(ProtocolError::InvalidPayload(
                        "podcastId must be non-empty".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Encode to the wire form.
    pub fn to_json(&self) -> String {
        // Serialization of these enums cannot fail: no maps with non-string
        // keys, no non-finite floats.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
