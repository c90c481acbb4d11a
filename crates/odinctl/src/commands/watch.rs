//! `odinctl watch`: run the synchronizer and print each refresh.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::ProgressBar;

use odinctl_core::{Dashboard, DashboardConfig, DisplayStore, Resource};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    config: DashboardConfig,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let dashboard = Dashboard::new(config);

    let spinner = (!global.quiet && io::stderr().is_terminal()).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_message(format!("connecting to {}", dashboard.config().server));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });
    let started = dashboard.start().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    started?;

    let store = dashboard.store();
    let mut ticks = store.subscribe_poll_count();
    let mut printed = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
                output::print_output(&render_tick(store, global.output), global.quiet);
                printed += 1;
                if args.count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
        }
    }

    dashboard.stop().await;
    Ok(())
}

fn render_tick(store: &DisplayStore, format: OutputFormat) -> String {
    let snap = store.snapshot();
    output::render_single(format, &snap, |s| line(store, s), |s| line(store, s))
}

fn line(store: &DisplayStore, snap: &odinctl_core::DisplaySnapshot) -> String {
    let time = store
        .last_poll()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();
    let mut line = format!("{time} {}", util::status_line(snap));

    for resource in [Resource::BackgroundTask, Resource::Device] {
        if let Some(err) = store.status(resource).last_error {
            line.push_str(&format!(" [{resource} stale: {err}]"));
        }
    }
    line
}
