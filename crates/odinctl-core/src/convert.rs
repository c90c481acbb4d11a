// ── Wire → display conversions ──

use odinctl_api::AdapterTree;

use crate::model::{DeviceStatus, SettableParameters};

impl From<&AdapterTree> for DeviceStatus {
    fn from(tree: &AdapterTree) -> Self {
        Self {
            my_parameter: tree.my_parameter.clone(),
            odin_version: tree.odin_version.clone(),
            tornado_version: tree.tornado_version.clone(),
            server_uptime: tree.server_uptime,
        }
    }
}

impl From<AdapterTree> for SettableParameters {
    fn from(tree: AdapterTree) -> Self {
        Self {
            value: tree.my_settable_parameter,
            value2: tree.my_settable_parameter_2,
            text: tree.my_settable_parameter_text,
            mode: tree.my_settable_parameter_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Number, json};

    use super::*;

    #[test]
    fn tree_splits_into_device_and_settable() {
        let tree: AdapterTree = serde_json::from_value(json!({
            "my_parameter": 17,
            "my_settable_parameter": 42.5,
            "my_settable_parameter_2": 0,
            "my_settable_parameter_text": "abc",
            "my_settable_parameter_mode": "Mode1",
            "odin_version": "1.3.0",
            "server_uptime": 12.5
        }))
        .expect("valid tree");

        let device = DeviceStatus::from(&tree);
        assert_eq!(device.my_parameter, json!(17));
        assert_eq!(device.odin_version.as_deref(), Some("1.3.0"));
        assert_eq!(device.tornado_version, None);

        let settable = SettableParameters::from(tree);
        assert_eq!(settable.value, Number::from_f64(42.5));
        assert_eq!(settable.mode.as_deref(), Some("Mode1"));
    }
}
