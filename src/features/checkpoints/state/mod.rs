//! Observable fetch state for UI layers.
//!
//! Each adapter owns a `tokio::sync::watch` channel of snapshots. Fetches are
//! ticketed: a response is applied only if no newer fetch was issued after
//! it, so the snapshot always reflects the latest request.

mod checkpoint_detail;
mod checkpoint_list;

use std::sync::atomic::{AtomicU64, Ordering};

pub use checkpoint_detail::{CheckpointDetailSnapshot, CheckpointDetailState};
pub use checkpoint_list::{CheckpointListSnapshot, CheckpointListState};

#[derive(Debug, Default)]
struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    /// Ticket for a new request; supersedes every earlier ticket
    fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Drop whatever is in flight without starting anything new
    fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequencer_newest_ticket_wins() {
        let seq = RequestSequencer::default();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));

        seq.invalidate();
        assert!(!seq.is_current(second));
    }
}
