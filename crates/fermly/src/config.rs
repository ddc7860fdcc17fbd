//! CLI configuration: a thin wrapper around `fermly_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--username`, `--timeout`).

use std::time::Duration;

use fermly_core::SessionConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fermly_config::{
    CachedTokens, Config, Profile, TokenCache, config_path, load_config_or_default, save_config,
    store_password,
};

/// Everything a session-bound command needs from configuration.
pub struct Resolved {
    pub profile_name: String,
    pub session: SessionConfig,
    pub poll_interval: Duration,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the session configuration for the active profile.
///
/// Flags win over the profile; a bare `--username` (or `FERMLY_USERNAME`)
/// works without any config file.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let fallback = Profile::default();
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None if global.username.is_some() => &fallback,
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let username = match global.username {
        Some(ref username) => username.clone(),
        None => fermly_config::resolve_username(profile, &profile_name)?,
    };
    let password = fermly_config::resolve_password(profile, &profile_name)?;

    let mut transport = fermly_config::transport_for(&cfg, profile)?;
    if let Some(secs) = global.timeout {
        transport = transport.with_timeout(Duration::from_secs(secs));
    }

    Ok(Resolved {
        poll_interval: cfg.poll_interval_for(profile),
        session: SessionConfig::new(username, password).with_transport(transport),
        profile_name,
    })
}
