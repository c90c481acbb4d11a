// ── Display-side status types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Number, Value};
use strum::{EnumIter, IntoStaticStr};

use super::parameter::{ParameterValue, SettableField};

/// Read-only device state refreshed on every polling tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceStatus {
    /// Any JSON scalar reported by the adapter.
    pub my_parameter: Value,
    pub odin_version: Option<String>,
    pub tornado_version: Option<String>,
    pub server_uptime: Option<f64>,
}

/// The four settable fields as last read or written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettableParameters {
    #[serde(rename = "my_settable_parameter")]
    pub value: Option<Number>,
    #[serde(rename = "my_settable_parameter_2")]
    pub value2: Option<Number>,
    #[serde(rename = "my_settable_parameter_text")]
    pub text: Option<String>,
    #[serde(rename = "my_settable_parameter_mode")]
    pub mode: Option<String>,
}

impl SettableParameters {
    /// Current value of `field` rendered as input text.
    ///
    /// Numbers use their JSON form, so a loaded `42.5` submits back as
    /// `42.5` unchanged.
    pub fn input_text(&self, field: SettableField) -> String {
        match field {
            SettableField::Value => self.value.as_ref().map(ToString::to_string),
            SettableField::Value2 => self.value2.as_ref().map(ToString::to_string),
            SettableField::Text => self.text.clone(),
            SettableField::Mode => self.mode.clone(),
        }
        .unwrap_or_default()
    }

    /// Record an accepted write locally.
    pub fn apply(&mut self, field: SettableField, value: &ParameterValue) {
        match (field, value) {
            (SettableField::Value, ParameterValue::Number(n)) => self.value = Some(n.clone()),
            (SettableField::Value2, ParameterValue::Number(n)) => self.value2 = Some(n.clone()),
            (SettableField::Text, v) => self.text = Some(v.to_string()),
            (SettableField::Mode, v) => self.mode = Some(v.to_string()),
            // Numeric fields only ever receive coerced numbers.
            (SettableField::Value | SettableField::Value2, ParameterValue::Text(_)) => {}
        }
    }
}

/// A display resource with its own request sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    Adapters,
    BackgroundTask,
    Device,
    Settable,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.into())
    }
}

/// Outcome of the most recent requests for a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceStatus {
    /// When a response was last applied.
    pub last_ok: Option<DateTime<Utc>>,
    /// Error text of the last failure, cleared by the next success.
    pub last_error: Option<String>,
}

impl ResourceStatus {
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn input_text_keeps_json_number_form() {
        let params = SettableParameters {
            value: Number::from_f64(42.5),
            value2: Some(Number::from(3)),
            text: Some("hello".into()),
            mode: None,
        };
        assert_eq!(params.input_text(SettableField::Value), "42.5");
        assert_eq!(params.input_text(SettableField::Value2), "3");
        assert_eq!(params.input_text(SettableField::Text), "hello");
        assert_eq!(params.input_text(SettableField::Mode), "");
    }

    #[test]
    fn apply_records_written_value() {
        let mut params = SettableParameters::default();
        params.apply(SettableField::Mode, &ParameterValue::Text("Mode2".into()));
        params.apply(SettableField::Value, &ParameterValue::Number(Number::from(9)));
        assert_eq!(params.mode.as_deref(), Some("Mode2"));
        assert_eq!(params.value, Some(Number::from(9)));
    }

    #[test]
    fn resource_names_are_snake_case() {
        assert_eq!(Resource::BackgroundTask.to_string(), "background_task");
    }
}
