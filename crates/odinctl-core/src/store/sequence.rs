// ── Per-resource request sequencing ──
//
// Every read takes a ticket before it is sent. A response is applied only
// if its ticket is newer than the last applied one, so a slow response can
// never overwrite a fresher one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Position of a request in its resource's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl Sequencer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the next ticket.
    pub(crate) fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Mark `ticket` applied if nothing newer has been applied yet.
    pub(crate) fn try_apply(&self, ticket: Ticket) -> bool {
        self.applied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (ticket.0 > current).then_some(ticket.0)
            })
            .is_ok()
    }

    /// Supersede every request issued so far. Used after a write so reads
    /// sent before it cannot restore the pre-write value.
    pub(crate) fn invalidate(&self) {
        let ticket = self.issue();
        self.applied.fetch_max(ticket.0, Ordering::SeqCst);
    }

    /// Whether a response for `ticket` arrives too late to matter.
    pub(crate) fn is_superseded(&self, ticket: Ticket) -> bool {
        ticket.0 <= self.applied.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_responses_apply() {
        let seq = Sequencer::new();
        let a = seq.issue();
        let b = seq.issue();
        assert!(seq.try_apply(a));
        assert!(seq.try_apply(b));
    }

    #[test]
    fn late_response_is_discarded() {
        let seq = Sequencer::new();
        let slow = seq.issue();
        let fast = seq.issue();
        assert!(seq.try_apply(fast));
        assert!(!seq.try_apply(slow));
        assert!(seq.is_superseded(slow));
    }

    #[test]
    fn invalidate_supersedes_in_flight_reads() {
        let seq = Sequencer::new();
        let before_write = seq.issue();
        seq.invalidate();
        assert!(!seq.try_apply(before_write));

        let after_write = seq.issue();
        assert!(!seq.is_superseded(after_write));
        assert!(seq.try_apply(after_write));
    }
}
