// Adapter-scoped endpoints
//
// Reads of the adapter's parameter tree and its background task subtree,
// plus the two PUT targets used by parameter editors.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::OdinClient;
use crate::error::Error;
use crate::models::{AdapterTree, ApiVersion, BackgroundTask, BackgroundTaskResponse};

const BACKGROUND_TASK: &str = "background_task";

impl OdinClient {
    /// Fetch the adapter's full parameter tree.
    ///
    /// `GET /api/{version}/{adapter}`
    pub async fn get_adapter_tree(
        &self,
        version: &ApiVersion,
        adapter: &str,
    ) -> Result<AdapterTree, Error> {
        let url = self.api_url(version, &[adapter])?;
        debug!(adapter, "fetching adapter tree");
        self.get(url).await
    }

    /// Fetch the background task counters.
    ///
    /// `GET /api/{version}/{adapter}/background_task`
    pub async fn get_background_task(
        &self,
        version: &ApiVersion,
        adapter: &str,
    ) -> Result<BackgroundTask, Error> {
        let url = self.api_url(version, &[adapter, BACKGROUND_TASK])?;
        debug!(adapter, "fetching background task");
        let resp: BackgroundTaskResponse = self.get(url).await?;
        Ok(resp.background_task)
    }

    /// Write parameters at the adapter root.
    ///
    /// `PUT /api/{version}/{adapter}` with a JSON object body. Returns the
    /// tree the adapter echoes back after applying the change.
    pub async fn put_adapter(
        &self,
        version: &ApiVersion,
        adapter: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        let url = self.api_url(version, &[adapter])?;
        self.put(url, body).await
    }

    /// Write parameters of the background task subtree.
    ///
    /// `PUT /api/{version}/{adapter}/background_task`
    pub async fn put_background_task(
        &self,
        version: &ApiVersion,
        adapter: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        let url = self.api_url(version, &[adapter, BACKGROUND_TASK])?;
        self.put(url, body).await
    }

    /// Start or stop the background task: `{"enable": bool}`.
    pub async fn set_task_enable(
        &self,
        version: &ApiVersion,
        adapter: &str,
        enable: bool,
    ) -> Result<Value, Error> {
        debug!(adapter, enable, "setting background task enable");
        self.put_background_task(version, adapter, &json!({ "enable": enable }))
            .await
    }

    /// Change the background task period in seconds: `{"interval": secs}`.
    pub async fn set_task_interval(
        &self,
        version: &ApiVersion,
        adapter: &str,
        interval_secs: f64,
    ) -> Result<Value, Error> {
        debug!(adapter, interval_secs, "setting background task interval");
        self.put_background_task(version, adapter, &json!({ "interval": interval_secs }))
            .await
    }
}
