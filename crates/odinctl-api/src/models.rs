// Wire types for the ODIN adapter API
//
// Field names mirror the server's parameter tree exactly. Optional fields
// are tolerated so that adapters exposing a subset of the tree still parse.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// API version string confirmed by the `/api` handshake.
///
/// Some server builds report the version as a JSON number (`0.1`), others
/// as a string (`"0.1"`); both deserialize to the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ApiVersion(String);

impl ApiVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

/// `GET /api`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiVersionResponse {
    pub api: ApiVersion,
}

/// `GET /api/{version}/adapters/`
#[derive(Debug, Clone, Deserialize)]
pub struct AdaptersResponse {
    pub adapters: Vec<String>,
}

/// Background task counters and controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTask {
    /// Iterations of the server's IOLoop periodic callback.
    pub ioloop_count: u64,
    /// Iterations of the server's worker thread loop.
    pub thread_count: u64,
    pub enable: bool,
    /// Task period in seconds. Not every adapter exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
}

/// `GET /api/{version}/{adapter}/background_task`
#[derive(Debug, Clone, Deserialize)]
pub struct BackgroundTaskResponse {
    pub background_task: BackgroundTask,
}

/// `GET /api/{version}/{adapter}`: the adapter's full parameter tree.
///
/// The server stores whatever JSON a PUT carries, so every optional field
/// decodes leniently: a value of the wrong type reads as `None` instead of
/// rejecting the tree (and with it `my_parameter`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterTree {
    /// Read-only scalar; any JSON scalar is accepted.
    #[serde(default)]
    pub my_parameter: Value,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub my_settable_parameter: Option<Number>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub my_settable_parameter_2: Option<Number>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub my_settable_parameter_text: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub my_settable_parameter_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub odin_version: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tornado_version: Option<String>,
    /// Seconds since the adapter was initialised.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub server_uptime: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub background_task: Option<BackgroundTask>,
}

/// Decode `T` if the value has the expected shape, `None` otherwise.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// `{"error": "..."}` body returned by adapters on HTTP 400.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn api_version_accepts_string_and_number() {
        let s: ApiVersionResponse = serde_json::from_value(json!({ "api": "0.1" })).expect("string version");
        let n: ApiVersionResponse = serde_json::from_value(json!({ "api": 0.1 })).expect("numeric version");
        assert_eq!(s.api.as_str(), "0.1");
        assert_eq!(n.api, s.api);
    }

    #[test]
    fn background_task_interval_is_optional() {
        let resp: BackgroundTaskResponse = serde_json::from_value(json!({
            "background_task": { "ioloop_count": 5, "thread_count": 2, "enable": true }
        }))
        .expect("task response");
        assert_eq!(resp.background_task.ioloop_count, 5);
        assert_eq!(resp.background_task.thread_count, 2);
        assert!(resp.background_task.enable);
        assert_eq!(resp.background_task.interval, None);
    }

    #[test]
    fn adapter_tree_keeps_number_representation() {
        let tree: AdapterTree = serde_json::from_value(json!({
            "my_parameter": 7,
            "my_settable_parameter": 42.5,
            "my_settable_parameter_2": 3,
            "my_settable_parameter_text": "Hello",
            "my_settable_parameter_mode": "Mode1",
            "server_uptime": 12.25
        }))
        .expect("adapter tree");
        assert_eq!(tree.my_parameter, json!(7));
        assert_eq!(tree.my_settable_parameter.as_ref().map(ToString::to_string).as_deref(), Some("42.5"));
        assert_eq!(tree.my_settable_parameter_2.as_ref().map(ToString::to_string).as_deref(), Some("3"));
        assert_eq!(tree.my_settable_parameter_mode.as_deref(), Some("Mode1"));
        assert!(tree.odin_version.is_none());
    }

    #[test]
    fn mistyped_fields_do_not_reject_the_tree() {
        let tree: AdapterTree = serde_json::from_value(json!({
            "my_parameter": 9,
            "my_settable_parameter": "abc",
            "my_settable_parameter_2": 4,
            "my_settable_parameter_text": 5,
            "my_settable_parameter_mode": "Mode3",
            "server_uptime": "soon",
            "background_task": [1, 2]
        }))
        .expect("tree with mistyped fields");
        assert_eq!(tree.my_parameter, json!(9));
        assert_eq!(tree.my_settable_parameter, None);
        assert_eq!(tree.my_settable_parameter_2, Some(Number::from(4)));
        assert_eq!(tree.my_settable_parameter_text, None);
        assert_eq!(tree.my_settable_parameter_mode.as_deref(), Some("Mode3"));
        assert_eq!(tree.server_uptime, None);
        assert_eq!(tree.background_task, None);
    }
}
