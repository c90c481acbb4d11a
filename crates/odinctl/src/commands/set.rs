//! `odinctl set <field> <value>`: the parameter editors.

use odinctl_core::{Command as CoreCommand, CommandResult, Dashboard, DashboardConfig};

use crate::cli::{GlobalOpts, OutputFormat, SetArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    config: DashboardConfig,
    args: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let field = util::parse_field(&args.field)?;
    // Validate before connecting so bad input never reaches the server.
    let command = CoreCommand::edit(field, &args.value)?;

    let result = Dashboard::oneshot(config, |d| async move { d.execute(command).await }).await?;

    let value = match result.response.get(field.wire_name()) {
        Some(v) => util::scalar(v),
        None => args.value.clone(),
    };
    report(&result, &format!("Set {} = {value}", field.wire_name()), global);
    Ok(())
}

/// Print the server's response for structured formats, a notice otherwise.
pub fn report(result: &CommandResult, notice: &str, global: &GlobalOpts) {
    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            output::print_notice(&format!("✓ {notice}"), global.quiet);
        }
        format => {
            let out = output::render_single(format, &result.response, |_| String::new(), |_| {
                String::new()
            });
            output::print_output(&out, global.quiet);
        }
    }
}
