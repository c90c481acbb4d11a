// ── Settable parameters ──
//
// The four user-editable fields of the adapter tree and the coercion
// rules applied to raw input before it is sent.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::error::CoreError;

/// A field of the adapter tree that can be written with `PUT`.
///
/// Parses from either the short CLI name (`value`, `value2`, `text`,
/// `mode`) or the wire name (`my_settable_parameter`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SettableField {
    #[strum(serialize = "value", serialize = "my_settable_parameter")]
    Value,
    #[strum(serialize = "value2", serialize = "my_settable_parameter_2")]
    Value2,
    #[strum(serialize = "text", serialize = "my_settable_parameter_text")]
    Text,
    #[strum(serialize = "mode", serialize = "my_settable_parameter_mode")]
    Mode,
}

/// How raw input for a field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Text,
}

impl SettableField {
    /// Key used in the adapter tree and in `PUT` bodies.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Value => "my_settable_parameter",
            Self::Value2 => "my_settable_parameter_2",
            Self::Text => "my_settable_parameter_text",
            Self::Mode => "my_settable_parameter_mode",
        }
    }

    /// Short name used on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Value2 => "value2",
            Self::Text => "text",
            Self::Mode => "mode",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Value => "Settable parameter",
            Self::Value2 => "Settable parameter 2",
            Self::Text => "Text parameter",
            Self::Mode => "Mode",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Value | Self::Value2 => FieldKind::Numeric,
            Self::Text | Self::Mode => FieldKind::Text,
        }
    }

    /// All fields in display order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

impl fmt::Display for SettableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Value carried by a parameter edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Number(Number),
    Text(String),
}

impl ParameterValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::Number(n.clone()),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A single-field update. Serializes as `{ "<wire_name>": value }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterUpdate {
    pub field: SettableField,
    pub value: ParameterValue,
}

impl ParameterUpdate {
    /// Build an update from raw input text, as an input control would
    /// hold it. Numeric fields are coerced, text fields pass through.
    pub fn from_input(field: SettableField, raw: &str) -> Result<Self, CoreError> {
        let value = match field.kind() {
            FieldKind::Numeric => ParameterValue::Number(coerce_number(raw).map_err(|_| {
                CoreError::validation(format!("{} expects a number, got {raw:?}", field.wire_name()))
            })?),
            FieldKind::Text => ParameterValue::Text(raw.to_owned()),
        };
        Ok(Self { field, value })
    }
}

impl Serialize for ParameterUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match &self.value {
            ParameterValue::Number(n) => map.serialize_entry(self.field.wire_name(), n)?,
            ParameterValue::Text(s) => map.serialize_entry(self.field.wire_name(), s)?,
        }
        map.end()
    }
}

/// Coerce raw input to a JSON number.
///
/// Whitespace is trimmed and empty input is `0`. Integer-looking input
/// stays an integer so it round-trips unchanged; anything else must parse
/// as a finite float. Whole floats within `i64` range (`1e3`, `5.0`) are
/// sent as integers.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
pub fn coerce_number(raw: &str) -> Result<Number, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Number::from(0));
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Ok(Number::from(u));
    }
    let f = trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| CoreError::validation(format!("not a finite number: {raw:?}")))?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Ok(Number::from(f as i64));
    }
    Number::from_f64(f).ok_or_else(|| CoreError::validation(format!("not a finite number: {raw:?}")))
}
