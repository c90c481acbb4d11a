#![allow(clippy::unwrap_used)]
// Integration tests for `OdinClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use odinctl_api::{ApiVersion, Error, OdinClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, OdinClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = OdinClient::with_client(reqwest::Client::new(), base_url).unwrap();
    (server, client)
}

fn v01() -> ApiVersion {
    ApiVersion::new("0.1")
}

// ── Handshake ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_handshake() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "api": "0.1" })))
        .expect(1)
        .mount(&server)
        .await;

    let version = client.handshake().await.unwrap();
    assert_eq!(version, v01());
}

#[tokio::test]
async fn test_handshake_numeric_version() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "api": 0.1 })))
        .mount(&server)
        .await;

    let version = client.handshake().await.unwrap();
    assert_eq!(version.as_str(), "0.1");
}

// ── Adapter listing ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_adapters_uses_trailing_slash() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/0.1/adapters/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "adapters": ["system_info", "workshop"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let adapters = client.list_adapters(&v01()).await.unwrap();
    assert_eq!(adapters, vec!["system_info", "workshop"]);
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_background_task() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop/background_task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "background_task": {
                "ioloop_count": 5,
                "thread_count": 2,
                "enable": true,
                "interval": 1.0
            }
        })))
        .mount(&server)
        .await;

    let task = client.get_background_task(&v01(), "workshop").await.unwrap();
    assert_eq!(task.ioloop_count, 5);
    assert_eq!(task.thread_count, 2);
    assert!(task.enable);
    assert_eq!(task.interval, Some(1.0));
}

#[tokio::test]
async fn test_get_adapter_tree() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "odin_version": "1.3.0",
            "tornado_version": "6.1",
            "server_uptime": 42.0,
            "my_parameter": 3,
            "my_settable_parameter": 42.5,
            "my_settable_parameter_2": 0,
            "my_settable_parameter_text": "Hello",
            "my_settable_parameter_mode": "Mode1",
            "background_task": {
                "ioloop_count": 1, "thread_count": 1, "enable": false, "interval": 1.0
            }
        })))
        .mount(&server)
        .await;

    let tree = client.get_adapter_tree(&v01(), "workshop").await.unwrap();
    assert_eq!(tree.my_parameter, json!(3));
    assert_eq!(tree.my_settable_parameter_text.as_deref(), Some("Hello"));
    assert_eq!(tree.odin_version.as_deref(), Some("1.3.0"));
    assert_eq!(tree.server_uptime, Some(42.0));
    assert!(!tree.background_task.unwrap().enable);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_put_adapter_sends_json() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "my_settable_parameter": 42.5 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "my_settable_parameter": 42.5 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client
        .put_adapter(&v01(), "workshop", &json!({ "my_settable_parameter": 42.5 }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_task_enable() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop/background_task"))
        .and(body_json(json!({ "enable": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "enable": false })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_task_enable(&v01(), "workshop", false).await.unwrap();
}

#[tokio::test]
async fn test_set_task_interval() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop/background_task"))
        .and(body_json(json!({ "interval": 0.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "interval": 0.5 })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_task_interval(&v01(), "workshop", 0.5).await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_adapter_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "Invalid path: my_missing_parameter" })),
        )
        .mount(&server)
        .await;

    let result = client
        .put_adapter(&v01(), "workshop", &json!({ "my_missing_parameter": 1 }))
        .await;

    match result {
        Err(Error::Api { status, ref message }) => {
            assert_eq!(status, 400);
            assert!(
                message.contains("my_missing_parameter"),
                "expected adapter message, got: {message}"
            );
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_adapter_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = client.get_adapter_tree(&v01(), "nope").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop/background_task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let result = client.get_background_task(&v01(), "workshop").await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
