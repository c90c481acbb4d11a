//! Connects the [`Dashboard`] display store to TUI actions.
//!
//! Runs as a background task: starts the synchronizer, then forwards every
//! display change, request status and lifecycle transition as an
//! [`Action`] through the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use odinctl_core::{Command, CoreError, Dashboard, Resource};

use crate::action::{Action, EditRequest, Notification};

/// Start `dashboard` and forward its display store until cancelled.
///
/// The dashboard is stopped before this returns.
pub async fn spawn_data_bridge(
    dashboard: Dashboard,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let store = dashboard.store().clone();
    let mut state = dashboard.subscribe_state();
    let mut api_version = store.subscribe_api_version();
    let mut adapters = store.subscribe_adapters();
    let mut task = store.subscribe_background_task();
    let mut device = store.subscribe_device();
    let mut settable = store.subscribe_settable();
    let mut polls = store.subscribe_poll_count();
    let mut adapters_status = store.subscribe_status(Resource::Adapters);
    let mut task_status = store.subscribe_status(Resource::BackgroundTask);
    let mut device_status = store.subscribe_status(Resource::Device);
    let mut settable_status = store.subscribe_status(Resource::Settable);

    // Forward lifecycle transitions while the startup reads run.
    let start = dashboard.start();
    tokio::pin!(start);
    let started = loop {
        tokio::select! {
            () = cancel.cancelled() => {
                dashboard.stop().await;
                return;
            }
            result = &mut start => break result,
            Ok(()) = state.changed() => {
                let s = *state.borrow_and_update();
                let _ = action_tx.send(Action::StateChanged(s));
            }
        }
    };

    if let Err(e) = started {
        warn!(error = %e, "failed to start dashboard");
        let _ = action_tx.send(Action::StateChanged(dashboard.state()));
        let _ = action_tx.send(Action::Disconnected(e.to_string()));
        return;
    }

    // Startup reads have landed: push the snapshot so the screen is
    // complete before the first change arrives.
    let _ = action_tx.send(Action::StateChanged(dashboard.state()));
    if let Some(v) = store.api_version() {
        let _ = action_tx.send(Action::ApiVersionUpdated(v));
    }
    if let Some(a) = adapters.latest() {
        let _ = action_tx.send(Action::AdaptersUpdated(a));
    }
    if let Some(s) = settable.latest() {
        let _ = action_tx.send(Action::SettableUpdated(s));
    }
    for resource in [Resource::Adapters, Resource::Settable] {
        let _ = action_tx.send(Action::ResourceStatusChanged(
            resource,
            store.status(resource),
        ));
    }
    // Mark everything seen so far as consumed.
    api_version.borrow_and_update();
    adapters_status.borrow_and_update();
    settable_status.borrow_and_update();

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = state.changed() => {
                let s = *state.borrow_and_update();
                let _ = action_tx.send(Action::StateChanged(s));
            }
            Some(Some(t)) = task.changed() => {
                let _ = action_tx.send(Action::BackgroundTaskUpdated(t));
            }
            Some(Some(d)) = device.changed() => {
                let _ = action_tx.send(Action::DeviceUpdated(d));
            }
            Some(Some(s)) = settable.changed() => {
                debug!("dispatching SettableUpdated");
                let _ = action_tx.send(Action::SettableUpdated(s));
            }
            Some(Some(a)) = adapters.changed() => {
                let _ = action_tx.send(Action::AdaptersUpdated(a));
            }
            Ok(()) = api_version.changed() => {
                let v = api_version.borrow_and_update().clone();
                if let Some(v) = v {
                    let _ = action_tx.send(Action::ApiVersionUpdated(v));
                }
            }
            Ok(()) = polls.changed() => {
                let n = *polls.borrow_and_update();
                let _ = action_tx.send(Action::Polled(n));
            }
            Ok(()) = task_status.changed() => {
                let s = task_status.borrow_and_update().clone();
                let _ = action_tx.send(Action::ResourceStatusChanged(Resource::BackgroundTask, s));
            }
            Ok(()) = device_status.changed() => {
                let s = device_status.borrow_and_update().clone();
                let _ = action_tx.send(Action::ResourceStatusChanged(Resource::Device, s));
            }
            Ok(()) = adapters_status.changed() => {
                let s = adapters_status.borrow_and_update().clone();
                let _ = action_tx.send(Action::ResourceStatusChanged(Resource::Adapters, s));
            }
            Ok(()) = settable_status.changed() => {
                let s = settable_status.borrow_and_update().clone();
                let _ = action_tx.send(Action::ResourceStatusChanged(Resource::Settable, s));
            }
            else => break,
        }
    }

    dashboard.stop().await;
    debug!("data bridge shut down");
}

/// Build the core command for a form request.
pub fn to_command(request: &EditRequest) -> Result<Command, CoreError> {
    match request {
        EditRequest::Field(field, raw) => Command::edit(*field, raw),
        EditRequest::Enable(enable) => Ok(Command::set_enable(*enable)),
        EditRequest::Interval(raw) => Command::parse_interval(raw),
    }
}

fn describe(request: &EditRequest) -> String {
    match request {
        EditRequest::Field(field, raw) => format!("{} set to {raw}", field.label()),
        EditRequest::Enable(true) => "Background task enabled".into(),
        EditRequest::Enable(false) => "Background task disabled".into(),
        EditRequest::Interval(raw) => format!("Task interval set to {}s", raw.trim()),
    }
}

/// Run one edit in the background and report the outcome as a
/// notification. Input errors are reported without contacting the server.
pub fn spawn_edit(
    dashboard: &Dashboard,
    request: EditRequest,
    action_tx: mpsc::UnboundedSender<Action>,
) {
    let command = match to_command(&request) {
        Ok(command) => command,
        Err(e) => {
            let _ = action_tx.send(Action::Notify(Notification::error(e.to_string())));
            return;
        }
    };

    let dashboard = dashboard.clone();
    tokio::spawn(async move {
        let note = match dashboard.execute(command).await {
            Ok(_) => Notification::success(describe(&request)),
            Err(e) => {
                warn!(error = %e, "edit rejected");
                Notification::error(e.to_string())
            }
        };
        let _ = action_tx.send(Action::Notify(note));
    });
}

/// Re-read the one-shot resources; failures become a warning.
pub fn spawn_reload(dashboard: &Dashboard, action_tx: mpsc::UnboundedSender<Action>) {
    let dashboard = dashboard.clone();
    tokio::spawn(async move {
        let (adapters, settable) =
            tokio::join!(dashboard.refresh_adapters(), dashboard.refresh_settable());
        let note = match adapters.and(settable) {
            Ok(()) => Notification::success("Reloaded adapters and settable parameters"),
            Err(e) => Notification::warning(format!("Reload failed: {e}")),
        };
        let _ = action_tx.send(Action::Notify(note));
    });
}
