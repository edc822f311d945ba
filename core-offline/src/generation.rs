//! Most-recent-wins gate for playback requests
//!
//! When playback requests overlap, only the newest one may commit its
//! result; earlier in-flight resolutions are allowed to complete and are
//! then discarded. The gate makes that explicit: each request takes a
//! [`Ticket`], and a resolution checks `is_current()` before committing
//! any state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic generation counter for a playback-control path.
#[derive(Debug, Clone, Default)]
pub struct PlaybackGate {
    current: Arc<AtomicU64>,
}

impl PlaybackGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request generation, superseding all earlier tickets.
    pub fn issue(&self) -> Ticket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            generation,
            current: Arc::clone(&self.current),
        }
    }
}

/// Handle identifying one request generation.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl Ticket {
    /// Whether this ticket still represents the newest request. A stale
    /// ticket's result must be discarded, not committed.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ticket_is_current() {
        let gate = PlaybackGate::new();
        let ticket = gate.issue();
        assert!(ticket.is_current());
    }

    #[test]
    fn test_newer_issue_supersedes_older_ticket() {
        let gate = PlaybackGate::new();
        let first = gate.issue();
        let second = gate.issue();

        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn test_gate_clones_share_the_counter() {
        let gate = PlaybackGate::new();
        let first = gate.issue();

        let clone = gate.clone();
        let second = clone.issue();

        assert!(!first.is_current());
        assert!(second.is_current());
    }
}
