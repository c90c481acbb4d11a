// ── Runtime connection configuration ──
//
// These types describe *how* to reach an ODIN server and which adapter
// to mirror. They never touch disk: the CLI/TUI resolves a
// `DashboardConfig` and hands it in.

use std::time::Duration;

use url::Url;

/// Default polling period of the status synchronizer.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). ODIN servers are usually plain HTTP,
    /// where this has no effect.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed lab certificates).
    DangerAcceptInvalid,
}

/// Configuration for mirroring a single adapter on a single server.
///
/// Built by CLI/TUI, passed to `Dashboard` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Server root URL (e.g., `http://127.0.0.1:8888`).
    pub server: Url,
    /// Adapter whose parameter tree is displayed and edited.
    pub adapter: String,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Period of the background-task / device-parameter refresh.
    pub poll_interval: Duration,
}

impl DashboardConfig {
    pub fn new(server: Url, adapter: impl Into<String>) -> Self {
        Self {
            server,
            adapter: adapter.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
