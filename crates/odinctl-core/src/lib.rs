//! Reactive data layer between `odinctl-api` and UI consumers (CLI / TUI).
//!
//! - **[`Dashboard`]**: Status synchronizer for one adapter.
//!   [`start()`](Dashboard::start) performs the API version handshake, the
//!   one-shot startup reads (adapter list, settable parameters), then spawns
//!   the polling task that refreshes the background task and device parameter
//!   every period until [`stop()`](Dashboard::stop).
//!   [`Dashboard::oneshot()`](Dashboard::oneshot) connects without polling,
//!   for single CLI invocations.
//!
//! - **[`Session`]**: The confirmed API version bound to a client and an
//!   adapter. Only a successful handshake produces one.
//!
//! - **[`DisplayStore`]**: `tokio::sync::watch` channels holding what is
//!   displayed, with per-resource request sequencing so late responses never
//!   overwrite fresher ones.
//!
//! - **[`Command`]**: Parameter editors. Built from raw input, validated,
//!   then routed through an `mpsc` channel to the command processor.

pub mod command;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{DEFAULT_POLL_INTERVAL, DashboardConfig, TlsVerification};
pub use dashboard::{Dashboard, SyncState};
pub use error::CoreError;
pub use session::Session;
pub use store::{DisplaySnapshot, DisplayStore};
pub use stream::DisplayStream;

pub use model::{
    ApiVersion, BackgroundTask, DeviceStatus, FieldKind, ParameterUpdate, ParameterValue, Resource,
    ResourceStatus, SettableField, SettableParameters, coerce_number,
};
