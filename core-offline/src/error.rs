//! # Offline Core Error Types

use std::time::Duration;
use thiserror::Error;

use crate::protocol::ProtocolError;

/// Errors that can occur inside the offline core.
///
/// Note the propagation policy: the request interceptor and the offline
/// library facade absorb these internally (synthesized responses, logged
/// `None`/`false` results). `OfflineError` reaches callers only from the
/// worker handle and repository layers.
#[derive(Error, Debug)]
pub enum OfflineError {
    // ========================================================================
    // Network
    // ========================================================================
    /// An outbound fetch failed at the network level.
    #[error("Network error: {0}")]
    Network(String),

    // ========================================================================
    // Storage
    // ========================================================================
    /// The structured store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// A named-cache operation failed.
    #[error("Cache error: {0}")]
    Cache(String),

    // ========================================================================
    // Protocol & Lifecycle
    // ========================================================================
    /// A sync-protocol message was malformed or carried an invalid payload.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The background worker is not running or its command channel is closed.
    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// No acknowledgement broadcast arrived within the bounded wait.
    #[error("Timed out after {0:?} waiting for worker acknowledgement")]
    AckTimeout(Duration),

    // ========================================================================
    // Generic
    // ========================================================================
    /// Error from a bridge capability.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OfflineError {
    /// Returns `true` if this error is transient and the operation can be
    /// retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OfflineError::Network(_) | OfflineError::AckTimeout(_)
        )
    }
}

/// Result type for offline core operations.
pub type Result<T> = std::result::Result<T, OfflineError>;
