//! Shared configuration for fermly.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), the
//! on-disk token cache, and translation to `fermly_core::SessionConfig`.
//! The CLI adds flag-aware wrappers on top.

mod token_cache;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fermly_core::{SessionConfig, TransportConfig};

pub use token_cache::{CachedTokens, TOKEN_CACHE_FILE, TokenCache};

/// Prefix for environment overrides of config keys (`FERMLY_DEFAULTS__TIMEOUT`).
pub const ENV_PREFIX: &str = "FERMLY_";
pub const USERNAME_ENV: &str = "FERMLY_USERNAME";
pub const PASSWORD_ENV: &str = "FERMLY_PASSWORD";

const KEYRING_SERVICE: &str = "fermly";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found in config")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("token cache is not valid JSON: {0}")]
    TokenCache(#[from] serde_json::Error),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }

    /// Request timeout for `profile`, falling back to the global default.
    pub fn timeout_for(&self, profile: &Profile) -> Duration {
        Duration::from_secs(profile.timeout.unwrap_or(self.defaults.timeout))
    }

    /// Host polling interval for `profile`, in minutes on disk.
    pub fn poll_interval_for(&self, profile: &Profile) -> Duration {
        let minutes = profile.poll_interval.unwrap_or(self.defaults.poll_interval);
        Duration::from_secs(minutes.max(1) * 60)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Minutes between refreshes in `fermly watch`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    15
}

/// A named Fermax Blue account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account e-mail.
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override the OAuth host (proxies, test servers).
    pub oauth_url: Option<String>,

    /// Override the REST API host.
    pub api_url: Option<String>,

    /// Override the polling interval (minutes).
    pub poll_interval: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "fermly", "fermly")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for runtime state such as cached tokens.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("fermly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Profile username, else `FERMLY_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    username_from_sources(profile, std::env::var(USERNAME_ENV).ok(), profile_name)
}

fn username_from_sources(
    profile: &Profile,
    env: Option<String>,
    profile_name: &str,
) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or(env)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the password: `FERMLY_PASSWORD`, then the system keyring, then
/// the plaintext value in the profile.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    password_from_sources(
        std::env::var(PASSWORD_ENV).ok(),
        || keyring_password(profile_name),
        profile,
        profile_name,
    )
}

fn password_from_sources(
    env: Option<String>,
    keyring: impl FnOnce() -> Option<String>,
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    env.filter(|pw| !pw.is_empty())
        .or_else(keyring)
        .or_else(|| profile.password.clone())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring_entry(profile_name).ok()?.get_password().ok()
}

/// Store the password for `profile_name` in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Transport settings for `profile`: production hosts unless overridden.
pub fn transport_for(config: &Config, profile: &Profile) -> Result<TransportConfig, ConfigError> {
    let mut transport = TransportConfig::default().with_timeout(config.timeout_for(profile));
    if let Some(ref raw) = profile.oauth_url {
        transport.oauth_url = parse_url("oauth_url", raw)?;
    }
    if let Some(ref raw) = profile.api_url {
        transport.api_url = parse_url("api_url", raw)?;
    }
    Ok(transport)
}

/// Build a `SessionConfig` from a profile with no flag overrides.
pub fn profile_to_session_config(
    config: &Config,
    profile: &Profile,
    profile_name: &str,
) -> Result<SessionConfig, ConfigError> {
    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;
    Ok(SessionConfig::new(username, password).with_transport(transport_for(config, profile)?))
}
