//! # Event Bus System
//!
//! Event-driven communication between the offline core and application
//! surfaces, built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The background worker cannot be called synchronously and cannot return
//! values to the page; everything it has to say travels as a broadcast
//! event. The same bus carries foreground library events so UI code has a
//! single subscription point for offline state changes.
//!
//! - **Event Types**: tagged-union enums per domain (worker, library,
//!   recovery), serializable for hosts that relay them over a JS boundary
//! - **EventBus**: central broadcast channel; every subscriber receives
//!   every event
//! - **EventStream**: receiver wrapper with predicate filtering
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, OfflineEvent, WorkerEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut sub = bus.subscribe();
//!
//! bus.emit(OfflineEvent::Worker(WorkerEvent::PodcastCached {
//!     podcast_id: "p1".to_string(),
//! }))
//! .ok();
//!
//! let received = sub.recv().await.unwrap();
//! assert!(matches!(received, OfflineEvent::Worker(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `RecvError::Lagged(n)` means a slow subscriber missed `n` events and is
//! non-fatal; `RecvError::Closed` signals shutdown. Subscribers should skip
//! past `Lagged` and exit on `Closed`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum OfflineEvent {
    /// Broadcasts from the background worker
    Worker(WorkerEvent),
    /// Events from the foreground offline library
    Library(LibraryEvent),
    /// Stale-build recovery events
    Recovery(RecoveryEvent),
}

impl OfflineEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            OfflineEvent::Worker(e) => e.description(),
            OfflineEvent::Library(e) => e.description(),
            OfflineEvent::Recovery(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            OfflineEvent::Recovery(RecoveryEvent::ReloadRequired { .. }) => EventSeverity::Error,
            OfflineEvent::Library(LibraryEvent::CachingComplete { failed_assets, .. })
                if *failed_assets > 0 =>
            {
                EventSeverity::Warning
            }
            OfflineEvent::Worker(WorkerEvent::Activated) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Podcast id carried by the event, when it concerns a single podcast.
    pub fn podcast_id(&self) -> Option<&str> {
        match self {
            OfflineEvent::Worker(WorkerEvent::PodcastCached { podcast_id })
            | OfflineEvent::Worker(WorkerEvent::PodcastRemoved { podcast_id })
            | OfflineEvent::Library(LibraryEvent::CachingComplete { podcast_id, .. }) => {
                Some(podcast_id)
            }
            _ => None,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Worker Events
// ============================================================================

/// Broadcasts sent by the background worker to all connected surfaces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum WorkerEvent {
    /// The worker finished activation and has taken control.
    Activated,
    /// All requested assets for a podcast were processed (individual
    /// failures included) and the metadata entry was stored.
    PodcastCached {
        /// The podcast whose assets were prefetched.
        podcast_id: String,
    },
    /// A podcast's metadata entry and listed assets were removed.
    PodcastRemoved {
        /// The podcast that was evicted.
        podcast_id: String,
    },
}

impl WorkerEvent {
    fn description(&self) -> &str {
        match self {
            WorkerEvent::Activated => "Worker activated and controlling clients",
            WorkerEvent::PodcastCached { .. } => "Podcast assets cached",
            WorkerEvent::PodcastRemoved { .. } => "Podcast removed from cache",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events published by the foreground offline library facade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A save-offline operation finished. `failed_assets` counts the asset
    /// downloads that did not succeed; the record is stored regardless.
    CachingComplete {
        /// The podcast that was saved.
        podcast_id: String,
        /// Number of asset downloads that failed (0..=3).
        failed_assets: u32,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::CachingComplete { .. } => "Offline save complete",
        }
    }
}

// ============================================================================
// Recovery Events
// ============================================================================

/// Events from the stale-build recovery path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RecoveryEvent {
    /// All caches were purged after a stale-chunk failure; the host should
    /// reload the application.
    ReloadRequired {
        /// What triggered the purge.
        reason: String,
    },
}

impl RecoveryEvent {
    fn description(&self) -> &str {
        match self {
            RecoveryEvent::ReloadRequired { .. } => "Caches purged, reload required",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OfflineEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: OfflineEvent) -> Result<usize, SendError<OfflineEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<OfflineEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&OfflineEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with predicate filtering.
///
/// Used by callers that wait for one specific event, e.g. the acknowledged
/// cache-podcast path waiting for its `PodcastCached` broadcast.
pub struct EventStream {
    receiver: Receiver<OfflineEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<OfflineEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream; only matching events are
    /// returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&OfflineEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events. Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<OfflineEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        let event = OfflineEvent::Worker(WorkerEvent::Activated);

        // Should error when no subscribers
        assert!(bus.emit(event).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = OfflineEvent::Worker(WorkerEvent::PodcastCached {
            podcast_id: "p1".to_string(),
        });

        bus.emit(event.clone()).ok();

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| event.podcast_id() == Some("wanted"));

        bus.emit(OfflineEvent::Worker(WorkerEvent::PodcastCached {
            podcast_id: "other".to_string(),
        }))
        .ok();
        bus.emit(OfflineEvent::Worker(WorkerEvent::PodcastCached {
            podcast_id: "wanted".to_string(),
        }))
        .ok();

        let received = stream.recv().await.unwrap();
        assert_eq!(received.podcast_id(), Some("wanted"));
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2); // Very small buffer
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(OfflineEvent::Worker(WorkerEvent::PodcastCached {
                podcast_id: format!("p{}", i),
            }))
            .ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let reload = OfflineEvent::Recovery(RecoveryEvent::ReloadRequired {
            reason: "chunk mismatch".to_string(),
        });
        assert_eq!(reload.severity(), EventSeverity::Error);

        let partial = OfflineEvent::Library(LibraryEvent::CachingComplete {
            podcast_id: "p1".to_string(),
            failed_assets: 1,
        });
        assert_eq!(partial.severity(), EventSeverity::Warning);

        let clean = OfflineEvent::Library(LibraryEvent::CachingComplete {
            podcast_id: "p1".to_string(),
            failed_assets: 0,
        });
        assert_eq!(clean.severity(), EventSeverity::Debug);

        let activated = OfflineEvent::Worker(WorkerEvent::Activated);
        assert_eq!(activated.severity(), EventSeverity::Info);
    }

    #[test]
    fn test_event_serialization() {
        let event = OfflineEvent::Worker(WorkerEvent::PodcastCached {
            podcast_id: "p-123".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("p-123"));
        assert!(json.contains("PodcastCached"));

        let deserialized: OfflineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_podcast_id_accessor() {
        let event = OfflineEvent::Worker(WorkerEvent::PodcastRemoved {
            podcast_id: "p9".to_string(),
        });
        assert_eq!(event.podcast_id(), Some("p9"));

        let activated = OfflineEvent::Worker(WorkerEvent::Activated);
        assert_eq!(activated.podcast_id(), None);
    }
}
