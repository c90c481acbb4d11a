//! `odinctl params`: the four settable parameters.

use odinctl_core::{Dashboard, DashboardConfig, SettableField};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct Param {
    field: &'static str,
    parameter: &'static str,
    value: String,
}

#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Parameter")]
    parameter: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(config: DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let params = Dashboard::oneshot(config, |d| async move { util::settable(&d).await }).await?;

    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let rows: Vec<Param> = SettableField::all()
                .map(|field| Param {
                    field: field.short_name(),
                    parameter: field.wire_name(),
                    value: util::field_value(&params, field),
                })
                .collect();
            output::render_list(
                global.output,
                &rows,
                |p| ParamRow {
                    field: p.field,
                    parameter: p.parameter,
                    value: p.value.clone(),
                },
                |p| format!("{}={}", p.parameter, p.value),
            )
        }
        // Structured formats keep the server's types (numbers stay numbers).
        _ => output::render_single(global.output, params.as_ref(), |_| String::new(), |_| {
            String::new()
        }),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
