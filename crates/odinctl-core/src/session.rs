// ── Negotiated session ──
//
// A `Session` only exists once the version handshake has succeeded, so
// every request built from it carries the confirmed API version.

use std::sync::Arc;

use odinctl_api::transport::{TlsMode, TransportConfig};
use odinctl_api::{AdapterTree, ApiVersion, BackgroundTask, OdinClient};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::{DashboardConfig, TlsVerification};
use crate::error::CoreError;

/// Request context for one adapter on one server.
///
/// Cheap to clone; handed to the polling task and the command processor
/// instead of sharing a mutable version string.
#[derive(Debug, Clone)]
pub struct Session {
    client: OdinClient,
    version: ApiVersion,
    adapter: Arc<str>,
}

impl Session {
    /// Build a client from `config` and perform the handshake.
    pub async fn connect(config: &DashboardConfig) -> Result<Self, CoreError> {
        if config.adapter.trim().is_empty() {
            return Err(CoreError::Config {
                message: "adapter name is empty".into(),
            });
        }

        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
        };
        let client = OdinClient::new(config.server.clone(), &transport)?;
        Self::establish(client, &config.adapter).await
    }

    /// Perform the `/api` handshake and bind the result to `adapter`.
    pub async fn establish(client: OdinClient, adapter: &str) -> Result<Self, CoreError> {
        let version = client.handshake().await?;
        info!(%version, adapter, "API version confirmed");
        Ok(Self::new(client, version, adapter))
    }

    /// Build a session from an already-known version.
    pub fn new(client: OdinClient, version: ApiVersion, adapter: &str) -> Self {
        Self {
            client,
            version,
            adapter: Arc::from(adapter),
        }
    }

    pub fn version(&self) -> &ApiVersion {
        &self.version
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    pub fn client(&self) -> &OdinClient {
        &self.client
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn adapters(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.client.list_adapters(&self.version).await?)
    }

    pub async fn adapter_tree(&self) -> Result<AdapterTree, CoreError> {
        Ok(self
            .client
            .get_adapter_tree(&self.version, &self.adapter)
            .await?)
    }

    pub async fn background_task(&self) -> Result<BackgroundTask, CoreError> {
        Ok(self
            .client
            .get_background_task(&self.version, &self.adapter)
            .await?)
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub(crate) async fn put_adapter(
        &self,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, CoreError> {
        Ok(self
            .client
            .put_adapter(&self.version, &self.adapter, body)
            .await?)
    }

    pub(crate) async fn set_task_enable(&self, enable: bool) -> Result<Value, CoreError> {
        Ok(self
            .client
            .set_task_enable(&self.version, &self.adapter, enable)
            .await?)
    }

    pub(crate) async fn set_task_interval(&self, secs: f64) -> Result<Value, CoreError> {
        Ok(self
            .client
            .set_task_interval(&self.version, &self.adapter, secs)
            .await?)
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
