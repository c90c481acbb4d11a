//! `odinctl status`: one polling tick plus the startup reads.

use std::fmt::Write;

use odinctl_core::{Dashboard, DashboardConfig, DisplaySnapshot, SettableField};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(config: DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let server = config.server.to_string();
    let adapter = config.adapter.clone();

    let snap = Dashboard::oneshot(config, |d| async move {
        d.poll_once().await?;
        util::settable(&d).await?;
        Ok(d.store().snapshot())
    })
    .await?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &snap,
        |s| detail(s, &server, &adapter, color),
        plain,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(snap: &DisplaySnapshot, server: &str, adapter: &str, color: bool) -> String {
    let mut out = String::new();
    let api = snap
        .api_version
        .as_ref()
        .map_or_else(|| "?".into(), ToString::to_string);
    let _ = writeln!(
        out,
        "Adapter      {adapter} {}",
        output::dim(&format!("({server}, API {api})"), color)
    );

    if let Some(ref task) = snap.background_task {
        let _ = writeln!(
            out,
            "Task         {}  ioloop {}  thread {}{}",
            output::flag(task.enable, color),
            task.ioloop_count,
            task.thread_count,
            task.interval
                .map(|i| format!("  interval {i}s"))
                .unwrap_or_default()
        );
    }

    if let Some(ref device) = snap.device {
        let _ = writeln!(out, "Parameter    {}", util::scalar(&device.my_parameter));
        let mut info = Vec::new();
        if let Some(ref v) = device.odin_version {
            info.push(format!("odin {v}"));
        }
        if let Some(ref v) = device.tornado_version {
            info.push(format!("tornado {v}"));
        }
        if let Some(secs) = device.server_uptime {
            info.push(format!("up {}", util::uptime(secs)));
        }
        if !info.is_empty() {
            let _ = writeln!(out, "Server       {}", info.join(", "));
        }
    }

    if let Some(ref params) = snap.settable {
        let _ = writeln!(out, "Settable");
        for field in SettableField::all() {
            let _ = writeln!(
                out,
                "  {:<26} {}",
                field.wire_name(),
                util::field_value(params, field)
            );
        }
    }

    out.trim_end().to_owned()
}

fn plain(snap: &DisplaySnapshot) -> String {
    let mut lines = Vec::new();
    if let Some(ref task) = snap.background_task {
        lines.push(format!("ioloop_count={}", task.ioloop_count));
        lines.push(format!("thread_count={}", task.thread_count));
        lines.push(format!("enable={}", task.enable));
    }
    if let Some(ref device) = snap.device {
        lines.push(format!("my_parameter={}", util::scalar(&device.my_parameter)));
    }
    if let Some(ref params) = snap.settable {
        for field in SettableField::all() {
            lines.push(format!("{}={}", field.wire_name(), params.input_text(field)));
        }
    }
    lines.join("\n")
}
