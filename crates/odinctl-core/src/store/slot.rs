// ── Single display value with request bookkeeping ──

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use super::sequence::{Sequencer, Ticket};
use crate::model::{Resource, ResourceStatus};

/// One displayed resource: its latest value, the outcome of the last
/// request, and the sequence that orders responses.
///
/// The value check and the write happen under the channel's lock, so
/// concurrent responses are applied strictly in ticket order.
pub(crate) struct Slot<T> {
    resource: Resource,
    value: watch::Sender<Option<Arc<T>>>,
    status: watch::Sender<ResourceStatus>,
    seq: Sequencer,
}

impl<T> Slot<T> {
    pub(crate) fn new(resource: Resource) -> Self {
        let (value, _) = watch::channel(None);
        let (status, _) = watch::channel(ResourceStatus::default());
        Self {
            resource,
            value,
            status,
            seq: Sequencer::new(),
        }
    }

    pub(crate) fn ticket(&self) -> Ticket {
        self.seq.issue()
    }

    /// Replace the value with a response. Returns `false` when a newer
    /// response or a write got there first.
    pub(crate) fn apply(&self, ticket: Ticket, value: T) -> bool {
        let mut value = Some(value);
        let applied = self.value.send_if_modified(|current| {
            if !self.seq.try_apply(ticket) {
                return false;
            }
            *current = value.take().map(Arc::new);
            true
        });

        if applied {
            self.mark_ok();
        } else {
            debug!(resource = %self.resource, ?ticket, "discarding out-of-order response");
        }
        applied
    }

    /// Record a failed request. The displayed value is left untouched.
    pub(crate) fn fail(&self, ticket: Ticket, error: &impl ToString) {
        if self.seq.is_superseded(ticket) {
            return;
        }
        let message = error.to_string();
        self.status.send_modify(|s| s.last_error = Some(message));
    }

    pub(crate) fn get(&self) -> Option<Arc<T>> {
        self.value.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<Arc<T>>> {
        self.value.subscribe()
    }

    pub(crate) fn status(&self) -> ResourceStatus {
        self.status.borrow().clone()
    }

    pub(crate) fn subscribe_status(&self) -> watch::Receiver<ResourceStatus> {
        self.status.subscribe()
    }

    fn mark_ok(&self) {
        self.status.send_modify(|s| {
            s.last_ok = Some(Utc::now());
            s.last_error = None;
        });
    }
}

impl<T: Clone + Default> Slot<T> {
    /// Apply a local edit after the server accepted it, superseding any
    /// read still in flight.
    pub(crate) fn write(&self, edit: impl FnOnce(&mut T)) {
        self.value.send_modify(|current| {
            self.seq.invalidate();
            let mut next = current.as_deref().cloned().unwrap_or_default();
            edit(&mut next);
            *current = Some(Arc::new(next));
        });
        self.mark_ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_value_and_clears_error() {
        let slot = Slot::<u32>::new(Resource::Device);
        let t = slot.ticket();
        slot.fail(t, &"connection refused");
        assert!(slot.status().is_stale());

        let t = slot.ticket();
        assert!(slot.apply(t, 7));
        assert_eq!(slot.get().as_deref(), Some(&7));
        let status = slot.status();
        assert!(status.last_error.is_none());
        assert!(status.last_ok.is_some());
    }

    #[test]
    fn failure_keeps_previous_value() {
        let slot = Slot::<u32>::new(Resource::BackgroundTask);
        let t = slot.ticket();
        slot.apply(t, 5);

        let t = slot.ticket();
        slot.fail(t, &"HTTP 500");
        assert_eq!(slot.get().as_deref(), Some(&5));
        assert_eq!(slot.status().last_error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn write_beats_read_sent_before_it() {
        let slot = Slot::<u32>::new(Resource::Settable);
        let stale_read = slot.ticket();
        slot.write(|v| *v = 42);
        assert!(!slot.apply(stale_read, 1));
        assert_eq!(slot.get().as_deref(), Some(&42));
    }

    #[test]
    fn superseded_failure_is_ignored() {
        let slot = Slot::<u32>::new(Resource::Device);
        let slow = slot.ticket();
        let fast = slot.ticket();
        slot.apply(fast, 3);
        slot.fail(slow, &"timed out");
        assert!(!slot.status().is_stale());
    }
}
