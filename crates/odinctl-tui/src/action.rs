//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use odinctl_core::{
    ApiVersion, BackgroundTask, DeviceStatus, Resource, ResourceStatus, SettableField,
    SettableParameters, SyncState,
};

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// A write requested from the form. Raw text is validated by the
/// dashboard, so bad input comes back as an error notification.
#[derive(Debug, Clone, PartialEq)]
pub enum EditRequest {
    Field(SettableField, String),
    Enable(bool),
    Interval(String),
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,

    // ── Navigation ────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    ToggleHelp,

    // ── Synchronizer ──────────────────────────────────────────────
    StateChanged(SyncState),
    Disconnected(String),
    ApiVersionUpdated(ApiVersion),
    AdaptersUpdated(Arc<Vec<String>>),
    BackgroundTaskUpdated(Arc<BackgroundTask>),
    DeviceUpdated(Arc<DeviceStatus>),
    SettableUpdated(Arc<SettableParameters>),
    ResourceStatusChanged(Resource, ResourceStatus),
    Polled(u64),

    // ── Commands ──────────────────────────────────────────────────
    Edit(EditRequest),
    /// Re-read the adapter list and settable parameters.
    Reload,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
