//! CLI configuration: a thin wrapper around `odinctl_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--server, --adapter, --timeout).

use odinctl_config::ConfigError;
use odinctl_core::DashboardConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use odinctl_config::{
    Config, Defaults, Profile, config_path, load_config, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Apply flag overrides to a profile.
///
/// Precedence: flag / env var (clap handles both) > profile > defaults.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(ref adapter) = global.adapter {
        profile.adapter.clone_from(adapter);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Build a `DashboardConfig` from the config file, profile, and CLI
/// overrides.
///
/// A named profile that does not exist is an error unless `--server`
/// was given, in which case the built-in profile is used as the base.
pub fn resolve_dashboard_config(
    global: &GlobalOpts,
    poll_interval_ms: Option<u64>,
) -> Result<DashboardConfig, CliError> {
    let cfg = load_config()?;
    let name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profile(Some(&name)) {
        Ok((_, profile)) => profile,
        Err(ConfigError::UnknownProfile { .. }) if global.server.is_some() => Profile::default(),
        Err(ConfigError::UnknownProfile { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&cfg),
            });
        }
        Err(e) => return Err(e.into()),
    };

    apply_overrides(&mut profile, global);
    if poll_interval_ms.is_some() {
        profile.poll_interval_ms = poll_interval_ms;
    }

    tracing::debug!(profile = %name, server = %profile.server, adapter = %profile.adapter, "resolved profile");
    Ok(odinctl_config::profile_to_dashboard_config(
        &profile,
        &cfg.defaults,
    )?)
}
