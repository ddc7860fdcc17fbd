use thiserror::Error;

/// Failure modes of the OAuth token exchange.
///
/// The host maps [`InvalidCredentials`](Self::InvalidCredentials) to a
/// user-correctable configuration problem; [`Unavailable`](Self::Unavailable)
/// is always transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token endpoint rejected the username/password (HTTP 400 or 401).
    #[error("Invalid credentials -- the account rejected the username or password")]
    InvalidCredentials,

    /// Any other status, a malformed token response, a transport failure,
    /// or a timeout.
    #[error("Authentication service unavailable: {reason}")]
    Unavailable { reason: String, timed_out: bool },
}

impl AuthError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            timed_out: false,
        }
    }

    /// Returns `true` if the token exchange hit the transport timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Unavailable { timed_out: true, .. })
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable {
            reason: describe_transport(&err),
            timed_out: err.is_timeout(),
        }
    }
}

/// Top-level error type for authenticated API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    // ── Authentication ──────────────────────────────────────────────
    /// Obtaining a valid token failed before or between requests.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The request was rejected with 401 again after one re-authentication.
    #[error("Session expired -- request rejected after re-authentication")]
    AuthExpired,

    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a status other than 200 or 401.
    #[error("Request failed (HTTP {status}): {body}")]
    RequestFailed { status: u16, body: String },

    /// Connection refused, DNS failure, timeout, or a broken response body.
    #[error("API unreachable: {reason}")]
    Unreachable { reason: String, timed_out: bool },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Setup ───────────────────────────────────────────────────────
    /// An endpoint URL could not be built from the configured base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl ApiError {
    /// Returns `true` if the error came from the credentials themselves,
    /// either at the token endpoint or as a repeated 401.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::InvalidCredentials) | Self::AuthExpired
        )
    }

    /// Returns `true` if retrying later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Auth(AuthError::Unavailable { .. }) | Self::Unreachable { .. } => true,
            Self::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the request (or its token exchange) timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Auth(auth) => auth.is_timeout(),
            Self::Unreachable { timed_out, .. } => *timed_out,
            _ => false,
        }
    }
}

/// Describe a transport failure, calling out timeouts explicitly.
fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".into()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unreachable {
            reason: describe_transport(&err),
            timed_out: err.is_timeout(),
        }
    }
}

/// Keep error bodies short enough for log lines and diagnostics.
pub(crate) fn body_preview(body: &str) -> String {
    body.chars().take(200).collect()
}
