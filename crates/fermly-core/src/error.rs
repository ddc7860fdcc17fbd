// ── Core error types ──
//
// Host-facing errors. Hosts only need to tell two things apart: problems
// the user must fix (wrong password, unknown door) and transient failures
// worth retrying on the next poll. The `From<ApiError>` impl does that
// translation for the transport layer.

use thiserror::Error;

use fermly_api::{ApiError, AuthError};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Invalid credentials -- check the username and password")]
    InvalidCredentials,

    #[error("Authentication service unavailable: {reason}")]
    AuthUnavailable { reason: String },

    #[error("Session expired -- the API rejected a freshly issued token")]
    SessionExpired,

    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Cannot reach the Fermax Blue API: {reason}")]
    Unreachable { reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("API request failed (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected API response: {message}")]
    Deserialization { message: String },

    // ── Doors ────────────────────────────────────────────────────────
    #[error("Door not found: {identifier}")]
    DoorNotFound { identifier: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` when retrying cannot help until the user changes something.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::DoorNotFound { .. } | Self::Config { .. }
        )
    }

    pub fn is_transient(&self) -> bool {
        !self.is_user_correctable()
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Unavailable { reason, .. } => Self::AuthUnavailable { reason },
        }
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err {
            ApiError::Auth(auth) => auth.into(),
            ApiError::AuthExpired => Self::SessionExpired,
            ApiError::RequestFailed { status, body } => Self::Api {
                status,
                message: body,
            },
            ApiError::Unreachable { reason, .. } => Self::Unreachable { reason },
            ApiError::Deserialization { message, body: _ } => Self::Deserialization { message },
            ApiError::InvalidUrl(message) | ApiError::ClientSetup(message) => {
                Self::Config { message }
            }
        }
    }
}
