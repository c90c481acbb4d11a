#![allow(clippy::unwrap_used)]
// Lifecycle tests for `Dashboard` against a wiremock ODIN server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Number, json};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use odinctl_core::{CoreError, Dashboard, DashboardConfig, Resource, SettableField, SyncState};

const POLL: Duration = Duration::from_millis(50);

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> DashboardConfig {
    DashboardConfig::new(Url::parse(&server.uri()).unwrap(), "workshop").with_poll_interval(POLL)
}

fn tree() -> serde_json::Value {
    json!({
        "my_parameter": 3,
        "my_settable_parameter": 42.5,
        "my_settable_parameter_2": 7,
        "my_settable_parameter_text": "hello",
        "my_settable_parameter_mode": "Mode1",
        "odin_version": "1.3.0",
        "tornado_version": "6.1",
        "server_uptime": 12.5
    })
}

async fn mount_handshake(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "api": "0.1" })))
        .mount(server)
        .await;
}

async fn mount_adapters(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/0.1/adapters/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "adapters": ["workshop", "system_info"] })),
        )
        .mount(server)
        .await;
}

async fn mount_background_task(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop/background_task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "background_task": { "ioloop_count": 5, "thread_count": 2, "enable": true }
        })))
        .mount(server)
        .await;
}

async fn mount_tree(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tree()))
        .mount(server)
        .await;
}

async fn mount_all(server: &MockServer) {
    mount_handshake(server).await;
    mount_adapters(server).await;
    mount_background_task(server).await;
    mount_tree(server).await;
}

async fn request_count(server: &MockServer, method_name: &str, p: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == method_name && r.url.path() == p)
        .count()
}

/// Adapter tree whose values advance on every request.
struct AdvancingTree(AtomicU64);

impl Respond for AdvancingTree {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(json!({
            "my_parameter": n,
            "my_settable_parameter": n,
            "my_settable_parameter_2": n,
            "my_settable_parameter_text": format!("text-{n}"),
            "my_settable_parameter_mode": "Mode1"
        }))
    }
}

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_uses_confirmed_version_everywhere() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.start().await.unwrap();
    assert_eq!(dashboard.state(), SyncState::Polling);
    tokio::time::sleep(POLL * 3).await;
    dashboard.stop().await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() > 3);
    for req in requests.iter().filter(|r| r.url.path() != "/api") {
        assert!(
            req.url.path().starts_with("/api/0.1/"),
            "unexpected path {}",
            req.url.path()
        );
    }
    assert_eq!(dashboard.store().api_version().unwrap().as_str(), "0.1");
}

#[tokio::test]
async fn test_handshake_failure_marks_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dashboard = Dashboard::new(config(&server));
    let err = dashboard.start().await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: 500, .. }));
    assert_eq!(dashboard.state(), SyncState::Failed);
    assert_eq!(request_count(&server, "GET", "/api/0.1/workshop").await, 0);
}

#[tokio::test]
async fn test_failed_startup_read_does_not_abort_start() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_background_task(&server).await;
    mount_tree(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/adapters/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.start().await.unwrap();
    dashboard.stop().await;

    let store = dashboard.store();
    assert!(store.adapters().is_none());
    assert!(store.status(Resource::Adapters).last_error.is_some());
    assert!(store.settable().is_some());
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_background_task_is_displayed() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.start().await.unwrap();
    tokio::time::sleep(POLL * 2).await;
    dashboard.stop().await;

    let task = dashboard.store().background_task().unwrap();
    assert_eq!(task.ioloop_count, 5);
    assert_eq!(task.thread_count, 2);
    assert!(task.enable);

    let device = dashboard.store().device().unwrap();
    assert_eq!(device.my_parameter, json!(3));
    assert_eq!(device.odin_version.as_deref(), Some("1.3.0"));
    assert_eq!(device.server_uptime, Some(12.5));
}

#[tokio::test]
async fn test_loop_repeats_status_reads_but_not_startup_reads() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_adapters(&server).await;
    mount_background_task(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop"))
        .respond_with(AdvancingTree(AtomicU64::new(0)))
        .mount(&server)
        .await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.start().await.unwrap();
    tokio::time::sleep(POLL * 6).await;
    dashboard.stop().await;

    assert_eq!(request_count(&server, "GET", "/api").await, 1);
    assert_eq!(request_count(&server, "GET", "/api/0.1/adapters/").await, 1);
    assert!(request_count(&server, "GET", "/api/0.1/workshop/background_task").await >= 3);

    let store = dashboard.store();
    assert!(store.poll_count() >= 3);

    // The settable values come from the single startup read...
    let settable = store.settable().unwrap();
    assert_eq!(settable.value, Some(Number::from(0)));
    assert_eq!(settable.text.as_deref(), Some("text-0"));

    // ...while the device parameter keeps advancing.
    let device = store.device().unwrap();
    assert!(device.my_parameter.as_u64().unwrap() >= 3);
}

#[tokio::test]
async fn test_failed_poll_keeps_last_value() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_adapters(&server).await;
    mount_tree(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop/background_task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "background_task": { "ioloop_count": 1, "thread_count": 1, "enable": false }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop/background_task"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "task unavailable" })),
        )
        .mount(&server)
        .await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.start().await.unwrap();
    tokio::time::sleep(POLL * 4).await;
    dashboard.stop().await;

    let store = dashboard.store();
    let task = store.background_task().unwrap();
    assert_eq!(task.ioloop_count, 1);

    let status = store.status(Resource::BackgroundTask);
    assert!(status.last_ok.is_some());
    assert!(status.last_error.unwrap().contains("task unavailable"));
}

#[tokio::test]
async fn test_mistyped_settable_field_does_not_block_device_poll() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_adapters(&server).await;
    mount_background_task(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "my_parameter": 9,
            "my_settable_parameter": "abc",
            "my_settable_parameter_2": 7,
            "my_settable_parameter_text": 5,
            "my_settable_parameter_mode": "Mode2"
        })))
        .mount(&server)
        .await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.start().await.unwrap();
    tokio::time::sleep(POLL * 3).await;
    dashboard.stop().await;

    let store = dashboard.store();
    assert_eq!(store.device().unwrap().my_parameter, json!(9));
    assert!(store.status(Resource::Device).last_error.is_none());

    let settable = store.settable().unwrap();
    assert_eq!(settable.value, None);
    assert_eq!(settable.value2, Some(Number::from(7)));
    assert_eq!(settable.text, None);
    assert_eq!(settable.mode.as_deref(), Some("Mode2"));
}

#[tokio::test]
async fn test_stop_halts_polling() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.start().await.unwrap();
    tokio::time::sleep(POLL * 3).await;
    dashboard.stop().await;
    assert_eq!(dashboard.state(), SyncState::Stopped);

    let before = server.received_requests().await.unwrap().len();
    tokio::time::sleep(POLL * 4).await;
    let after = server.received_requests().await.unwrap().len();
    assert_eq!(before, after);

    // A second stop is a no-op.
    dashboard.stop().await;
    assert_eq!(dashboard.state(), SyncState::Stopped);
}

#[tokio::test]
async fn test_oneshot_never_polls() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let adapters = Dashboard::oneshot(config(&server), |d| async move {
        Ok(d.store().adapters().unwrap().as_ref().clone())
    })
    .await
    .unwrap();

    assert_eq!(adapters, vec!["workshop".to_owned(), "system_info".to_owned()]);
    tokio::time::sleep(POLL * 2).await;
    assert_eq!(
        request_count(&server, "GET", "/api/0.1/workshop/background_task").await,
        0
    );
}

#[tokio::test]
async fn test_manual_refresh_rereads_settable() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_adapters(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/0.1/workshop"))
        .respond_with(AdvancingTree(AtomicU64::new(0)))
        .mount(&server)
        .await;

    Dashboard::oneshot(config(&server), |d| async move {
        assert_eq!(d.store().settable().unwrap().value, Some(Number::from(0)));
        d.refresh_settable().await?;
        assert_eq!(d.store().settable().unwrap().value, Some(Number::from(1)));
        d.refresh_adapters().await?;
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(request_count(&server, "GET", "/api/0.1/adapters/").await, 2);
}

// ── Editors ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_loaded_value_submits_unchanged() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop"))
        .and(body_json(json!({ "my_settable_parameter": 42.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "my_settable_parameter": 42.5 })))
        .expect(1)
        .mount(&server)
        .await;

    Dashboard::oneshot(config(&server), |d| async move {
        let input = d.store().settable().unwrap().input_text(SettableField::Value);
        assert_eq!(input, "42.5");
        d.edit(SettableField::Value, &input).await?;
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_text_editor_sends_single_string_field() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop"))
        .and(body_json(json!({ "my_settable_parameter_text": "12" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let settable = Dashboard::oneshot(config(&server), |d| async move {
        d.edit(SettableField::Text, "12").await?;
        Ok(d.store().settable().unwrap())
    })
    .await
    .unwrap();

    assert_eq!(settable.text.as_deref(), Some("12"));
    assert_eq!(request_count(&server, "PUT", "/api/0.1/workshop").await, 1);
}

#[tokio::test]
async fn test_numeric_editor_coerces_input() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop"))
        .and(body_json(json!({ "my_settable_parameter_2": 12 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Dashboard::oneshot(config(&server), |d| async move {
        d.edit(SettableField::Value2, " 12 ").await?;
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_enable_editor_sends_checkbox_state() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    for enable in [true, false] {
        Mock::given(method("PUT"))
            .and(path("/api/0.1/workshop/background_task"))
            .and(body_json(json!({ "enable": enable })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
    }

    Dashboard::oneshot(config(&server), |d| async move {
        d.set_task_enable(true).await?;
        d.set_task_enable(false).await?;
        assert!(!d.store().background_task().unwrap().enable);
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_interval_editor() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop/background_task"))
        .and(body_json(json!({ "interval": 0.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Dashboard::oneshot(config(&server), |d| async move {
        d.set_task_interval(0.5).await?;
        assert!(matches!(
            d.set_task_interval(-1.0).await,
            Err(CoreError::ValidationFailed { .. })
        ));
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rejected_edit_surfaces_adapter_message() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/0.1/workshop"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid mode: Mode9" })),
        )
        .mount(&server)
        .await;

    let dashboard = Dashboard::new(config(&server));
    dashboard.connect().await.unwrap();
    let err = dashboard
        .edit(SettableField::Mode, "Mode9")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Api { status: 400, ref message } if message == "Invalid mode: Mode9"));
    assert_eq!(
        dashboard.store().settable().unwrap().mode.as_deref(),
        Some("Mode1")
    );
    dashboard.stop().await;
}

#[tokio::test]
async fn test_invalid_numeric_input_sends_nothing() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    Dashboard::oneshot(config(&server), |d| async move {
        let result = d.edit(SettableField::Value, "not a number").await;
        assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(request_count(&server, "PUT", "/api/0.1/workshop").await, 0);
}
