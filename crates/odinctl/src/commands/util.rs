//! Shared helpers for command handlers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use odinctl_core::{
    CoreError, Dashboard, DeviceStatus, DisplaySnapshot, SettableField, SettableParameters,
};

use crate::error::CliError;

/// The adapter list from the startup read, re-read once if that read
/// failed so the caller sees the real error.
pub async fn adapters(dashboard: &Dashboard) -> Result<Arc<Vec<String>>, CoreError> {
    if dashboard.store().adapters().is_none() {
        dashboard.refresh_adapters().await?;
    }
    dashboard
        .store()
        .adapters()
        .ok_or_else(|| CoreError::Internal("adapter list missing after refresh".into()))
}

/// Settable parameters from the startup read, re-read once on failure.
pub async fn settable(dashboard: &Dashboard) -> Result<Arc<SettableParameters>, CoreError> {
    if dashboard.store().settable().is_none() {
        dashboard.refresh_settable().await?;
    }
    dashboard
        .store()
        .settable()
        .ok_or_else(|| CoreError::Internal("settable parameters missing after refresh".into()))
}

/// Parse a field name given on the command line.
pub fn parse_field(raw: &str) -> Result<SettableField, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "field".into(),
        reason: format!(
            "unknown parameter '{raw}'. Valid fields: {}",
            SettableField::all()
                .map(SettableField::short_name)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

/// JSON scalar as display text; strings are shown without quotes.
pub fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".into(),
        other => other.to_string(),
    }
}

/// Seconds as a coarse human duration (`1h 2m 3s`).
pub fn uptime(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "-".into();
    }
    let rounded = Duration::from_secs_f64(secs.floor());
    humantime::format_duration(rounded).to_string()
}

/// Parameter value as display text, `-` when the adapter did not report it.
pub fn field_value(params: &SettableParameters, field: SettableField) -> String {
    let text = params.input_text(field);
    if text.is_empty() && field.kind() == odinctl_core::FieldKind::Numeric {
        "-".into()
    } else {
        text
    }
}

/// One-line summary of a snapshot, used by `watch`.
pub fn status_line(snap: &DisplaySnapshot) -> String {
    let mut parts = Vec::new();
    if let Some(ref task) = snap.background_task {
        parts.push(format!("ioloop={}", task.ioloop_count));
        parts.push(format!("thread={}", task.thread_count));
        parts.push(format!("enable={}", task.enable));
        if let Some(interval) = task.interval {
            parts.push(format!("interval={interval}"));
        }
    }
    if let Some(DeviceStatus { ref my_parameter, .. }) = snap.device {
        parts.push(format!("my_parameter={}", scalar(my_parameter)));
    }
    if parts.is_empty() {
        "no data".into()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use odinctl_core::BackgroundTask;

    use super::*;

    #[test]
    fn field_names_accept_short_and_wire_forms() {
        assert_eq!(parse_field("value2").ok(), Some(SettableField::Value2));
        assert_eq!(
            parse_field("my_settable_parameter_text").ok(),
            Some(SettableField::Text)
        );
        let err = parse_field("colour").expect_err("unknown field");
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn scalars_render_without_quotes() {
        assert_eq!(scalar(&json!("abc")), "abc");
        assert_eq!(scalar(&json!(4.5)), "4.5");
        assert_eq!(scalar(&Value::Null), "-");
    }

    #[test]
    fn uptime_is_humanized() {
        assert_eq!(uptime(3723.9), "1h 2m 3s");
        assert_eq!(uptime(f64::NAN), "-");
    }

    #[test]
    fn status_line_lists_polled_values() {
        let snap = DisplaySnapshot {
            background_task: Some(BackgroundTask {
                ioloop_count: 5,
                thread_count: 2,
                enable: true,
                interval: None,
            }),
            device: Some(DeviceStatus {
                my_parameter: json!(7),
                ..DeviceStatus::default()
            }),
            ..DisplaySnapshot::default()
        };
        assert_eq!(status_line(&snap), "ioloop=5 thread=2 enable=true my_parameter=7");
        assert_eq!(status_line(&DisplaySnapshot::default()), "no data");
    }
}
