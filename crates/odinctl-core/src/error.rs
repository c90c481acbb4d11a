// ── Core error types ──
//
// User-facing errors from odinctl-core. Consumers never match on HTTP
// status codes or JSON parse failures directly: the
// `From<odinctl_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Not connected: the API version handshake has not completed")]
    NotConnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Unexpected response from server: {message}")]
    MalformedResponse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Server rejected the request (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<odinctl_api::Error> for CoreError {
    fn from(err: odinctl_api::Error) -> Self {
        match err {
            odinctl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Internal(e.to_string())
                }
            }
            odinctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            odinctl_api::Error::InvalidBaseUrl { url } => CoreError::Config {
                message: format!("Server URL cannot be used as a base: {url}"),
            },
            odinctl_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            odinctl_api::Error::Api {
                status: 404,
                message,
            } => CoreError::NotFound { path: message },
            odinctl_api::Error::Api { status, message } => CoreError::Api { status, message },
            odinctl_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn adapter_rejection_maps_to_api() {
        let err: CoreError = odinctl_api::Error::Api {
            status: 400,
            message: "Invalid path".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Api { status: 400, .. }));
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let err: CoreError = odinctl_api::Error::Api {
            status: 404,
            message: "/api/0.1/nope".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn bad_payload_maps_to_malformed() {
        let err: CoreError = odinctl_api::Error::Deserialization {
            message: "missing field `adapters`".into(),
            body: "{}".into(),
        }
        .into();
        assert!(err.to_string().contains("adapters"));
    }
}
