// ── Command API ──
//
// Every write against the adapter flows through this module. Commands
// are built from raw user input, validated here, and executed by the
// dashboard's command processor in submission order.

use serde_json::Value;

use crate::error::CoreError;
use crate::model::{ParameterUpdate, Resource, SettableField};

/// Envelope sent through the command channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// A single user-triggered write.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `PUT {"<field>": value}` to the adapter resource.
    SetParameter(ParameterUpdate),
    /// `PUT {"enable": bool}` to the background task.
    SetTaskEnable(bool),
    /// `PUT {"interval": secs}` to the background task.
    SetTaskInterval(f64),
}

impl Command {
    /// Editor for one settable field, from the text an input holds.
    pub fn edit(field: SettableField, raw: &str) -> Result<Self, CoreError> {
        ParameterUpdate::from_input(field, raw).map(Self::SetParameter)
    }

    /// Editor for the enable checkbox.
    pub fn set_enable(enable: bool) -> Self {
        Self::SetTaskEnable(enable)
    }

    /// Editor for the task period. Must be a positive, finite number of
    /// seconds.
    pub fn set_interval(secs: f64) -> Result<Self, CoreError> {
        if secs.is_finite() && secs > 0.0 {
            Ok(Self::SetTaskInterval(secs))
        } else {
            Err(CoreError::validation(format!(
                "interval must be a positive number of seconds, got {secs}"
            )))
        }
    }

    /// Same as [`set_interval`](Self::set_interval), from input text.
    pub fn parse_interval(raw: &str) -> Result<Self, CoreError> {
        let secs = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::validation(format!("interval expects a number, got {raw:?}")))?;
        Self::set_interval(secs)
    }

    /// The display resource this command writes to.
    pub fn resource(&self) -> Resource {
        match self {
            Self::SetParameter(_) => Resource::Settable,
            Self::SetTaskEnable(_) | Self::SetTaskInterval(_) => Resource::BackgroundTask,
        }
    }
}

/// Server acknowledgement of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub resource: Resource,
    /// Body returned by the `PUT`, usually the updated subtree.
    pub response: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParameterValue;

    #[test]
    fn edit_coerces_numeric_fields() {
        let cmd = Command::edit(SettableField::Value, "42.5").expect("valid");
        let Command::SetParameter(update) = cmd else {
            panic!("expected a parameter update");
        };
        assert!(matches!(update.value, ParameterValue::Number(_)));
        assert_eq!(update.value.to_string(), "42.5");
    }

    #[test]
    fn edit_rejects_garbage_for_numeric_fields() {
        assert!(matches!(
            Command::edit(SettableField::Value2, "twelve"),
            Err(CoreError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn interval_must_be_positive_and_finite() {
        assert!(Command::set_interval(0.5).is_ok());
        assert!(Command::set_interval(0.0).is_err());
        assert!(Command::set_interval(-1.0).is_err());
        assert!(Command::set_interval(f64::NAN).is_err());
        assert!(Command::parse_interval(" 2 ").is_ok());
        assert!(Command::parse_interval("soon").is_err());
    }

    #[test]
    fn commands_target_their_resource() {
        assert_eq!(Command::set_enable(true).resource(), Resource::BackgroundTask);
        assert_eq!(
            Command::edit(SettableField::Mode, "Mode1").expect("valid").resource(),
            Resource::Settable
        );
    }
}
