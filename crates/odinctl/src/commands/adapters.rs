//! `odinctl adapters`: the server's adapter list.

use odinctl_core::{Dashboard, DashboardConfig};
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AdapterRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Adapter")]
    name: String,
    #[tabled(rename = "Selected")]
    selected: &'static str,
}

pub async fn handle(config: DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let selected = config.adapter.clone();
    let adapters =
        Dashboard::oneshot(config, |d| async move { util::adapters(&d).await }).await?;

    let out = if global.output == OutputFormat::Table {
        let rows: Vec<AdapterRow> = adapters
            .iter()
            .enumerate()
            .map(|(index, name)| AdapterRow {
                index,
                name: name.clone(),
                selected: if *name == selected { "*" } else { "" },
            })
            .collect();
        output::render_table(&rows)
    } else {
        output::render_single(global.output, adapters.as_slice(), |_| String::new(), |a| {
            a.join("\n")
        })
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
