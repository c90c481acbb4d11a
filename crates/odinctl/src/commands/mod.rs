//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod adapters;
pub mod config_cmd;
pub mod params;
pub mod set;
pub mod status;
pub mod task;
pub mod util;
pub mod version;
pub mod watch;

use odinctl_core::DashboardConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: DashboardConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Version => version::handle(&config, global).await,
        Command::Adapters => adapters::handle(config, global).await,
        Command::Status => status::handle(config, global).await,
        Command::Params => params::handle(config, global).await,
        Command::Set(args) => set::handle(config, args, global).await,
        Command::Task(args) => task::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to a server handler".into(),
        )),
    }
}
