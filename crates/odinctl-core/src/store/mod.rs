// ── Display store ──
//
// Reactive state mirrored from the server. Front ends subscribe to the
// channels here instead of holding their own copies.

mod sequence;
mod slot;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use odinctl_api::{ApiVersion, BackgroundTask};
use serde::Serialize;
use tokio::sync::watch;

pub use sequence::Ticket;
pub(crate) use slot::Slot;

use crate::model::{DeviceStatus, Resource, ResourceStatus, SettableParameters};
use crate::stream::DisplayStream;

/// Everything the dashboard displays.
pub struct DisplayStore {
    pub(crate) api_version: watch::Sender<Option<ApiVersion>>,
    pub(crate) adapters: Slot<Vec<String>>,
    pub(crate) background_task: Slot<BackgroundTask>,
    pub(crate) device: Slot<DeviceStatus>,
    pub(crate) settable: Slot<SettableParameters>,
    pub(crate) poll_count: watch::Sender<u64>,
    pub(crate) last_poll: watch::Sender<Option<DateTime<Utc>>>,
}

/// Point-in-time copy of the store, for printing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    pub api_version: Option<ApiVersion>,
    pub adapters: Option<Vec<String>>,
    pub background_task: Option<BackgroundTask>,
    pub device: Option<DeviceStatus>,
    pub settable: Option<SettableParameters>,
}

impl DisplayStore {
    pub fn new() -> Self {
        let (api_version, _) = watch::channel(None);
        let (poll_count, _) = watch::channel(0);
        let (last_poll, _) = watch::channel(None);

        Self {
            api_version,
            adapters: Slot::new(Resource::Adapters),
            background_task: Slot::new(Resource::BackgroundTask),
            device: Slot::new(Resource::Device),
            settable: Slot::new(Resource::Settable),
            poll_count,
            last_poll,
        }
    }

    // ── Current values ───────────────────────────────────────────────

    pub fn api_version(&self) -> Option<ApiVersion> {
        self.api_version.borrow().clone()
    }

    pub fn adapters(&self) -> Option<Arc<Vec<String>>> {
        self.adapters.get()
    }

    pub fn background_task(&self) -> Option<Arc<BackgroundTask>> {
        self.background_task.get()
    }

    pub fn device(&self) -> Option<Arc<DeviceStatus>> {
        self.device.get()
    }

    pub fn settable(&self) -> Option<Arc<SettableParameters>> {
        self.settable.get()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            api_version: self.api_version(),
            adapters: self.adapters().map(|a| a.as_ref().clone()),
            background_task: self.background_task().map(|t| t.as_ref().clone()),
            device: self.device().map(|d| d.as_ref().clone()),
            settable: self.settable().map(|s| s.as_ref().clone()),
        }
    }

    // ── Request bookkeeping ──────────────────────────────────────────

    pub fn status(&self, resource: Resource) -> ResourceStatus {
        match resource {
            Resource::Adapters => self.adapters.status(),
            Resource::BackgroundTask => self.background_task.status(),
            Resource::Device => self.device.status(),
            Resource::Settable => self.settable.status(),
        }
    }

    pub fn subscribe_status(&self, resource: Resource) -> watch::Receiver<ResourceStatus> {
        match resource {
            Resource::Adapters => self.adapters.subscribe_status(),
            Resource::BackgroundTask => self.background_task.subscribe_status(),
            Resource::Device => self.device.subscribe_status(),
            Resource::Settable => self.settable.subscribe_status(),
        }
    }

    /// Completed polling ticks since start.
    pub fn poll_count(&self) -> u64 {
        *self.poll_count.borrow()
    }

    pub fn last_poll(&self) -> Option<DateTime<Utc>> {
        *self.last_poll.borrow()
    }

    pub(crate) fn mark_polled(&self) {
        self.poll_count.send_modify(|n| *n += 1);
        self.last_poll.send_replace(Some(Utc::now()));
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_api_version(&self) -> watch::Receiver<Option<ApiVersion>> {
        self.api_version.subscribe()
    }

    pub fn subscribe_adapters(&self) -> DisplayStream<Vec<String>> {
        DisplayStream::new(self.adapters.subscribe())
    }

    pub fn subscribe_background_task(&self) -> DisplayStream<BackgroundTask> {
        DisplayStream::new(self.background_task.subscribe())
    }

    pub fn subscribe_device(&self) -> DisplayStream<DeviceStatus> {
        DisplayStream::new(self.device.subscribe())
    }

    pub fn subscribe_settable(&self) -> DisplayStream<SettableParameters> {
        DisplayStream::new(self.settable.subscribe())
    }

    pub fn subscribe_poll_count(&self) -> watch::Receiver<u64> {
        self.poll_count.subscribe()
    }
}

impl Default for DisplayStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn snapshot_reflects_applied_values() {
        let store = DisplayStore::new();
        store.api_version.send_replace(Some(ApiVersion::new("0.1")));
        let t = store.background_task.ticket();
        store.background_task.apply(
            t,
            BackgroundTask {
                ioloop_count: 5,
                thread_count: 2,
                enable: true,
                interval: None,
            },
        );

        let snap = store.snapshot();
        assert_eq!(snap.api_version, Some(ApiVersion::new("0.1")));
        let task = snap.background_task.expect("task applied");
        assert_eq!((task.ioloop_count, task.thread_count, task.enable), (5, 2, true));
        assert!(snap.device.is_none());
    }

    #[test]
    fn snapshot_serializes_wire_names() {
        let store = DisplayStore::new();
        store.settable.write(|s| s.text = Some("abc".into()));
        let value = serde_json::to_value(store.snapshot()).expect("serializable");
        assert_eq!(
            value["settable"]["my_settable_parameter_text"],
            json!("abc")
        );
    }

    #[test]
    fn mark_polled_counts_ticks() {
        let store = DisplayStore::new();
        store.mark_polled();
        store.mark_polled();
        assert_eq!(store.poll_count(), 2);
        assert!(store.last_poll().is_some());
    }
}
