//! `odinctl-tui`: live terminal dashboard for one ODIN adapter.
//!
//! Mirrors the adapter's background task, device parameter and settable
//! parameters through `odinctl-core`'s [`Dashboard`], and edits them from
//! a form. Logs go to a file (default `/tmp/odinctl-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use odinctl_config::{ConfigError, Profile};
use odinctl_core::{Dashboard, DashboardConfig};

use crate::app::App;

/// Terminal dashboard for an ODIN adapter control server.
#[derive(Parser, Debug)]
#[command(name = "odinctl-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "ODIN_PROFILE")]
    profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(short = 'S', long, env = "ODIN_SERVER")]
    server: Option<String>,

    /// Adapter name (overrides profile)
    #[arg(short = 'a', long, env = "ODIN_ADAPTER")]
    adapter: Option<String>,

    /// Polling period in milliseconds (overrides profile)
    #[arg(short = 'i', long)]
    interval: Option<u64>,

    /// Log file path
    #[arg(long, default_value = "/tmp/odinctl-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Writing to stdout or stderr would corrupt the
/// display. The guard must live until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "odinctl_tui={level},odinctl_core={level},odinctl_api={level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let log_name = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("odinctl-tui.log"));

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, log_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the dashboard settings: flags and env over the profile over
/// the config defaults.
fn build_config(cli: &Cli) -> Result<DashboardConfig> {
    let cfg = odinctl_config::load_config()?;
    let (name, mut profile) = match cfg.profile(cli.profile.as_deref()) {
        Ok(found) => found,
        Err(ConfigError::UnknownProfile { name }) if cli.server.is_some() => {
            (name, Profile::default())
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(ref server) = cli.server {
        profile.server.clone_from(server);
    }
    if let Some(ref adapter) = cli.adapter {
        profile.adapter.clone_from(adapter);
    }
    if cli.interval.is_some() {
        profile.poll_interval_ms = cli.interval;
    }

    info!(profile = %name, server = %profile.server, adapter = %profile.adapter, "resolved profile");
    Ok(odinctl_config::profile_to_dashboard_config(
        &profile,
        &cfg.defaults,
    )?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first so a failure during setup still restores the terminal.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let config = build_config(&cli)?;
    info!(
        server = %config.server,
        adapter = %config.adapter,
        poll_ms = config.poll_interval.as_millis(),
        "starting odinctl-tui"
    );

    let mut app = App::new(Dashboard::new(config));
    app.run().await
}
