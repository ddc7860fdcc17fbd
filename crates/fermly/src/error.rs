//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use fermly_config::ConfigError;
use fermly_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(fermly::auth_failed),
        help(
            "Check the e-mail and password of the Fermax Blue account.\n\
             Run: fermly config set-password"
        )
    )]
    AuthFailed,

    #[error("Session expired")]
    #[diagnostic(
        code(fermly::session_expired),
        help(
            "The API rejected a freshly issued token.\n\
             Clear the cached tokens with: fermly token clear"
        )
    )]
    SessionExpired,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(fermly::no_credentials),
        help(
            "Configure credentials with: fermly config init\n\
             Or set FERMLY_USERNAME and FERMLY_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Could not reach Fermax Blue: {reason}")]
    #[diagnostic(
        code(fermly::connection_failed),
        help("Check your network connection and try again.")
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(fermly::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout,

    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(fermly::api_error))]
    ApiError { status: u16, message: String },

    // ── Doors ────────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fermly::not_found),
        help("Run: fermly {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("The intercom refused to open '{door}'")]
    #[diagnostic(
        code(fermly::door_refused),
        help("The account may not be allowed to operate this door right now.")
    )]
    DoorRefused { door: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fermly::validation))]
    Validation { field: String, reason: String },

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(fermly::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fermly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fermly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(fermly::no_config),
        help(
            "Create one with: fermly config init\n\
             Expected at: {path}\n\
             Or pass --username and set FERMLY_PASSWORD."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fermly::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(fermly::serialization))]
    Serialization(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed | Self::SessionExpired | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::ConnectionFailed { .. } | Self::ApiError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredentials => Self::AuthFailed,
            CoreError::SessionExpired => Self::SessionExpired,
            CoreError::AuthUnavailable { reason } | CoreError::Unreachable { reason } => {
                Self::ConnectionFailed { reason }
            }
            CoreError::Timeout => Self::Timeout,
            CoreError::Api { status, message } => Self::ApiError { status, message },
            CoreError::Deserialization { message } => Self::ApiError {
                status: 200,
                message,
            },
            CoreError::DoorNotFound { identifier } => Self::NotFound {
                resource_type: "door".into(),
                identifier,
                list_command: "doors list".into(),
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
