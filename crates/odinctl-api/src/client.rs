// ODIN API HTTP client
//
// Wraps `reqwest::Client` with versioned URL construction and the
// adapter error convention (`{"error": "..."}` with HTTP 400). Endpoint
// methods live in `system` and `adapter` to keep this module focused on
// transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ApiVersion, ErrorBody};
use crate::transport::TransportConfig;

/// Raw HTTP client for an ODIN control server.
///
/// Stateless with respect to the API version: every versioned call takes
/// the [`ApiVersion`] confirmed by [`handshake`](Self::handshake), so the
/// caller owns the session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OdinClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OdinClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the server root (e.g. `http://127.0.0.1:8888`). A path
    /// prefix is preserved, which allows servers mounted behind a proxy.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        Ok(Self { http, base_url })
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL. Segments are percent-encoded;
    /// an empty trailing segment yields a trailing slash.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a versioned URL: `{base}/api/{version}/{path...}`
    pub(crate) fn api_url(&self, version: &ApiVersion, path: &[&str]) -> Result<Url, Error> {
        let mut segments = Vec::with_capacity(path.len() + 2);
        segments.push("api");
        segments.push(version.as_str());
        segments.extend_from_slice(path);
        self.url(&segments)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Send a PUT request with a JSON body and decode the JSON response.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {}", url);

        // `.json()` sets `Content-Type: application/json`.
        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Map non-2xx responses to `Error::Api`, otherwise decode the body.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), len = body.len(), "response received");

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => err.error,
                Err(_) => preview(&body).to_owned(),
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> OdinClient {
        OdinClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).expect("valid base URL"),
        )
        .expect("client")
    }

    #[test]
    fn api_url_interpolates_version() {
        let c = client("http://localhost:8888");
        let url = c
            .api_url(&ApiVersion::new("0.1"), &["workshop", "background_task"])
            .expect("url");
        assert_eq!(url.as_str(), "http://localhost:8888/api/0.1/workshop/background_task");
    }

    #[test]
    fn trailing_empty_segment_keeps_slash() {
        let c = client("http://localhost:8888/");
        let url = c
            .api_url(&ApiVersion::new("0.1"), &["adapters", ""])
            .expect("url");
        assert_eq!(url.path(), "/api/0.1/adapters/");
    }

    #[test]
    fn base_path_prefix_is_preserved() {
        let c = client("http://proxy.local/odin/");
        let url = c.url(&["api"]).expect("url");
        assert_eq!(url.as_str(), "http://proxy.local/odin/api");
    }

    #[test]
    fn rejects_cannot_be_a_base_urls() {
        let result = OdinClient::with_client(
            reqwest::Client::new(),
            Url::parse("mailto:ops@example.com").expect("parses"),
        );
        assert!(matches!(result, Err(Error::InvalidBaseUrl { .. })));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= 200);
        assert!(body.starts_with(cut));
    }
}
