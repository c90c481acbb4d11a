// Server-level endpoints
//
// The version handshake is the only unversioned call; the adapter listing
// is versioned but not adapter-scoped.

use tracing::debug;

use crate::client::OdinClient;
use crate::error::Error;
use crate::models::{AdaptersResponse, ApiVersion, ApiVersionResponse};

impl OdinClient {
    /// Fetch the API version the server speaks.
    ///
    /// `GET /api`
    pub async fn handshake(&self) -> Result<ApiVersion, Error> {
        let url = self.url(&["api"])?;
        debug!("performing API version handshake");
        let resp: ApiVersionResponse = self.get(url).await?;
        Ok(resp.api)
    }

    /// List the adapters loaded by the server, in server order.
    ///
    /// `GET /api/{version}/adapters/`
    pub async fn list_adapters(&self, version: &ApiVersion) -> Result<Vec<String>, Error> {
        let url = self.api_url(version, &["adapters", ""])?;
        debug!("listing adapters");
        let resp: AdaptersResponse = self.get(url).await?;
        Ok(resp.adapters)
    }
}
