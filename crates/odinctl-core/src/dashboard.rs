// ── Status synchronizer ──
//
// Lifecycle of one mirrored adapter: version handshake, one-shot startup
// reads, the fixed-period polling loop, and the command processor that
// carries parameter edits back to the server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::model::{DeviceStatus, Resource, SettableField, SettableParameters};
use crate::session::Session;
use crate::store::{DisplayStore, Slot};

const COMMAND_CHANNEL_SIZE: usize = 16;

// ── SyncState ────────────────────────────────────────────────────

/// Lifecycle state observable by front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SyncState {
    /// Created, never started.
    Idle,
    /// Handshake and startup reads in progress.
    Initializing,
    /// Connected; edits are accepted but nothing is polled.
    Ready,
    /// Connected and refreshing every poll interval.
    Polling,
    Stopped,
    /// The handshake failed.
    Failed,
}

impl SyncState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Ready | Self::Polling)
    }
}

// ── Dashboard ────────────────────────────────────────────────────

/// Handle to a mirrored adapter.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Background tasks hold only
/// the session and the store, never the handle, so dropping the last
/// handle cancels them.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    store: Arc<DisplayStore>,
    state: watch::Sender<SyncState>,
    session: RwLock<Option<Session>>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current run. Replaced on every connect so a
    /// stopped dashboard can be started again.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for DashboardInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Dashboard {
    /// Create a dashboard. Does NOT talk to the server -- call
    /// [`start()`](Self::start) or [`connect()`](Self::connect).
    pub fn new(config: DashboardConfig) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(DashboardInner {
                config,
                store: Arc::new(DisplayStore::new()),
                state,
                session: RwLock::new(None),
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DisplayStore> {
        &self.inner.store
    }

    pub fn state(&self) -> SyncState {
        *self.inner.state.borrow()
    }

    /// Subscribe to lifecycle changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// The negotiated session, once connected.
    pub async fn session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start mirroring: connect, then poll until [`stop()`](Self::stop).
    pub async fn start(&self) -> Result<(), CoreError> {
        self.connect().await?;
        self.start_polling().await
    }

    /// Handshake, run the one-shot startup reads, and start accepting
    /// edits. Does not poll.
    ///
    /// Only a failed handshake is an error. A failed startup read leaves
    /// its resource empty with the error recorded.
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.state().is_connected() {
            return Ok(());
        }
        self.inner.state.send_replace(SyncState::Initializing);

        let session = match Session::connect(&self.inner.config).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, server = %self.inner.config.server, "handshake failed");
                self.inner.state.send_replace(SyncState::Failed);
                return Err(e);
            }
        };

        let store = &self.inner.store;
        store
            .api_version
            .send_replace(Some(session.version().clone()));

        let (adapters, settable) = tokio::join!(
            load_adapters(&session, store),
            load_settable(&session, store)
        );
        if let Err(e) = adapters {
            warn!(error = %e, "startup read of adapter list failed");
        }
        if let Err(e) = settable {
            warn!(error = %e, "startup read of settable parameters failed");
        }

        *self.inner.session.write().await = Some(session.clone());

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let store = Arc::clone(&self.inner.store);
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(command_processor_task(session, store, rx, child)));
        }

        self.inner.state.send_replace(SyncState::Ready);
        info!(adapter = %self.inner.config.adapter, "dashboard connected");
        Ok(())
    }

    /// Spawn the polling task. Requires a connected dashboard; a second
    /// call while polling is a no-op.
    pub async fn start_polling(&self) -> Result<(), CoreError> {
        match self.state() {
            SyncState::Polling => return Ok(()),
            SyncState::Ready => {}
            _ => return Err(CoreError::NotConnected),
        }

        let session = self.require_session().await?;
        let store = Arc::clone(&self.inner.store);
        let cancel = self.inner.cancel_child.lock().await.clone();
        let period = self.inner.config.poll_interval;

        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(poll_task(session, store, period, cancel)));

        self.inner.state.send_replace(SyncState::Polling);
        info!(?period, "polling started");
        Ok(())
    }

    /// Cancel background tasks and wait for them to finish. Idempotent.
    pub async fn stop(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        *self.inner.session.write().await = None;

        // The previous receiver was consumed by the command processor.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        if self.state() != SyncState::Stopped {
            self.inner.state.send_replace(SyncState::Stopped);
            debug!("dashboard stopped");
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Run one polling tick now: background task and device parameter.
    ///
    /// Both reads are always attempted; the first failure is returned.
    pub async fn poll_once(&self) -> Result<(), CoreError> {
        let session = self.require_session().await?;
        poll_tick(&session, &self.inner.store).await
    }

    /// Re-read the adapter list. Never called by the polling loop.
    pub async fn refresh_adapters(&self) -> Result<(), CoreError> {
        let session = self.require_session().await?;
        load_adapters(&session, &self.inner.store).await
    }

    /// Re-read the settable parameters. Never called by the polling loop.
    pub async fn refresh_settable(&self) -> Result<(), CoreError> {
        let session = self.require_session().await?;
        load_settable(&session, &self.inner.store).await
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command.
    ///
    /// Sends it through the command channel to the processor task and
    /// awaits the server's answer. Commands run in submission order.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if !self.state().is_connected() {
            return Err(CoreError::NotConnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotConnected)?;

        rx.await.map_err(|_| CoreError::NotConnected)?
    }

    /// Submit raw input for one settable field.
    pub async fn edit(&self, field: SettableField, raw: &str) -> Result<CommandResult, CoreError> {
        self.execute(Command::edit(field, raw)?).await
    }

    pub async fn set_task_enable(&self, enable: bool) -> Result<CommandResult, CoreError> {
        self.execute(Command::set_enable(enable)).await
    }

    pub async fn set_task_interval(&self, secs: f64) -> Result<CommandResult, CoreError> {
        self.execute(Command::set_interval(secs)?).await
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, stop.
    ///
    /// For the CLI: the polling task is never spawned.
    pub async fn oneshot<F, Fut, T>(config: DashboardConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let dashboard = Dashboard::new(config);
        dashboard.connect().await?;
        let result = f(dashboard.clone()).await;
        dashboard.stop().await;
        result
    }

    // ── Internals ────────────────────────────────────────────────

    async fn require_session(&self) -> Result<Session, CoreError> {
        self.inner
            .session
            .read()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)
    }
}

// ── Reads into the store ─────────────────────────────────────────

/// Issue one read for `slot`, applying the result or recording the error.
async fn track<T>(
    slot: &Slot<T>,
    read: impl Future<Output = Result<T, CoreError>>,
) -> Result<(), CoreError> {
    let ticket = slot.ticket();
    match read.await {
        Ok(value) => {
            slot.apply(ticket, value);
            Ok(())
        }
        Err(e) => {
            slot.fail(ticket, &e);
            Err(e)
        }
    }
}

async fn load_adapters(session: &Session, store: &DisplayStore) -> Result<(), CoreError> {
    track(&store.adapters, session.adapters()).await
}

async fn load_settable(session: &Session, store: &DisplayStore) -> Result<(), CoreError> {
    track(&store.settable, async {
        session.adapter_tree().await.map(SettableParameters::from)
    })
    .await
}

/// One polling tick. Both reads complete before the next tick fires.
async fn poll_tick(session: &Session, store: &DisplayStore) -> Result<(), CoreError> {
    let (task, device) = tokio::join!(
        track(&store.background_task, session.background_task()),
        track(&store.device, async {
            session
                .adapter_tree()
                .await
                .map(|tree| DeviceStatus::from(&tree))
        })
    );
    store.mark_polled();
    if let Err(ref e) = task {
        warn!(resource = %Resource::BackgroundTask, error = %e, "poll failed, keeping last value");
    }
    if let Err(ref e) = device {
        warn!(resource = %Resource::Device, error = %e, "poll failed, keeping last value");
    }
    task.and(device)
}

// ── Background tasks ─────────────────────────────────────────────

/// Refresh the background task and device parameter every `period`.
/// The first tick fires immediately.
async fn poll_task(
    session: Session,
    store: Arc<DisplayStore>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = poll_tick(&session, &store) => {}
                }
            }
        }
    }
    debug!("poll task exited");
}

/// Process commands from the mpsc channel, one at a time.
async fn command_processor_task(
    session: Session,
    store: Arc<DisplayStore>,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&session, &store, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

/// Send a command to the server. On success the accepted value is
/// written to the store, superseding reads issued before the write.
async fn route_command(
    session: &Session,
    store: &DisplayStore,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let resource = cmd.resource();
    let response = match cmd {
        Command::SetParameter(update) => {
            let response = session.put_adapter(&update).await?;
            info!(field = %update.field, value = %update.value, "parameter set");
            store
                .settable
                .write(|params| params.apply(update.field, &update.value));
            response
        }
        Command::SetTaskEnable(enable) => {
            let response = session.set_task_enable(enable).await?;
            info!(enable, "background task toggled");
            store.background_task.write(|task| task.enable = enable);
            response
        }
        Command::SetTaskInterval(secs) => {
            let response = session.set_task_interval(secs).await?;
            info!(secs, "background task interval set");
            store
                .background_task
                .write(|task| task.interval = Some(secs));
            response
        }
    };
    Ok(CommandResult { resource, response })
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn config() -> DashboardConfig {
        DashboardConfig::new(
            Url::parse("http://127.0.0.1:9").expect("valid url"),
            "workshop",
        )
    }

    #[test]
    fn new_dashboard_is_idle() {
        let dashboard = Dashboard::new(config());
        assert_eq!(dashboard.state(), SyncState::Idle);
        assert!(dashboard.store().api_version().is_none());
    }

    #[tokio::test]
    async fn commands_require_connection() {
        let dashboard = Dashboard::new(config());
        let result = dashboard.set_task_enable(true).await;
        assert!(matches!(result, Err(CoreError::NotConnected)));
    }

    #[tokio::test]
    async fn invalid_input_fails_before_connection_check() {
        let dashboard = Dashboard::new(config());
        let result = dashboard.edit(SettableField::Value, "abc").await;
        assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn polling_requires_connection() {
        let dashboard = Dashboard::new(config());
        assert!(matches!(
            dashboard.start_polling().await,
            Err(CoreError::NotConnected)
        ));
        assert!(matches!(
            dashboard.poll_once().await,
            Err(CoreError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let dashboard = Dashboard::new(config());
        dashboard.stop().await;
        dashboard.stop().await;
        assert_eq!(dashboard.state(), SyncState::Stopped);
    }

    #[tokio::test]
    async fn empty_adapter_name_fails_to_connect() {
        let dashboard = Dashboard::new(DashboardConfig::new(
            Url::parse("http://127.0.0.1:9").expect("valid url"),
            " ",
        ));
        assert!(matches!(
            dashboard.connect().await,
            Err(CoreError::Config { .. })
        ));
        assert_eq!(dashboard.state(), SyncState::Failed);
    }
}
