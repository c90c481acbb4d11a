//! `odinctl task`: background task enable and interval editors.

use odinctl_core::{Command as CoreCommand, Dashboard, DashboardConfig};

use crate::cli::{GlobalOpts, TaskArgs, TaskCommand};
use crate::error::CliError;

use super::set::report;

pub async fn handle(
    config: DashboardConfig,
    args: TaskArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (command, notice) = match args.command {
        TaskCommand::Enable => (CoreCommand::set_enable(true), "Background task enabled".to_owned()),
        TaskCommand::Disable => (
            CoreCommand::set_enable(false),
            "Background task disabled".to_owned(),
        ),
        TaskCommand::Interval { secs } => (
            CoreCommand::set_interval(secs)?,
            format!("Background task interval set to {secs}s"),
        ),
    };

    let result = Dashboard::oneshot(config, |d| async move { d.execute(command).await }).await?;
    report(&result, &notice, global);
    Ok(())
}
