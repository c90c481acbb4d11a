// ── Domain model ──
//
// Display-side types mirrored from the adapter tree, and the typed
// edits that flow back to the server.

pub mod parameter;
pub mod status;

pub use odinctl_api::{ApiVersion, BackgroundTask};
pub use parameter::{FieldKind, ParameterUpdate, ParameterValue, SettableField, coerce_number};
pub use status::{DeviceStatus, Resource, ResourceStatus, SettableParameters};
