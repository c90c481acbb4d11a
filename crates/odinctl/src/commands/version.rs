//! `odinctl version`: the handshake alone.

use serde::Serialize;

use odinctl_core::{ApiVersion, DashboardConfig, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct VersionInfo {
    server: String,
    api: ApiVersion,
}

pub async fn handle(config: &DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::connect(config).await?;
    let info = VersionInfo {
        server: config.server.to_string(),
        api: session.version().clone(),
    };

    let out = output::render_single(
        global.output,
        &info,
        |i| format!("API version {} at {}", i.api, i.server),
        |i| i.api.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
