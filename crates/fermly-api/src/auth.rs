// OAuth2 session management
//
// Password-grant login, refresh-token exchange, and the expiry bookkeeping
// that decides between them. The token state sits behind an async mutex
// that stays locked for the whole exchange, so concurrent callers that all
// see an expired token queue on the lock and reuse the first caller's result
// instead of issuing their own token request.

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::AuthError;

/// Pre-shared client credentials of the official app, sent as HTTP Basic
/// auth on every token request.
const OAUTH_CLIENT_AUTHORIZATION: &str = "Basic ZHB2N2lxejZlZTVtYXptMWlxOWR3MWQ0MnNseXV0NDhrajBtcDVmdm81OGo1aWg6Yzd5bGtxcHVqd2FoODV5aG5wcnYwd2R2eXp1dGxjbmt3NHN6OTBidWxkYnVsazE=";

/// Tokens are refreshed this long before the server-side expiry.
pub const REFRESH_BUFFER_SECS: i64 = 5 * 60;

/// Lifetime assumed when the token response omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

// ── Credentials ──────────────────────────────────────────────────────

/// Account credentials for the password grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

// ── Token state ──────────────────────────────────────────────────────

/// The OAuth token pair and its absolute expiry.
///
/// Serializable so the host can persist it between runs. Always replaced
/// as a whole; if `access_token` is set, `expires_at` is set too.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("TokenState")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TokenState {
    /// Whether a new token must be obtained before making a request at `now`.
    ///
    /// True when there is no token, no recorded expiry, or the expiry is
    /// within [`REFRESH_BUFFER_SECS`] of `now`.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => {
                now >= expires_at - Duration::seconds(REFRESH_BUFFER_SECS)
            }
            _ => true,
        }
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    fn from_response(resp: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let expires_in = resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Self {
            access_token: Some(resp.access_token),
            refresh_token: resp.refresh_token,
            expires_at: Some(issued_at + Duration::seconds(expires_in)),
        }
    }
}

/// Snapshot of the session for hosts (button availability, status output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No access token held.
    Unauthenticated,
    /// Token held and outside the refresh buffer.
    Valid { expires_at: DateTime<Utc> },
    /// Token held but expired or inside the refresh buffer; the next
    /// request refreshes it.
    Expiring { expires_at: DateTime<Utc> },
}

impl AuthState {
    pub fn has_token(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }

    fn of(state: &TokenState, now: DateTime<Utc>) -> Self {
        match (&state.access_token, state.expires_at) {
            (Some(_), Some(expires_at)) if state.needs_refresh_at(now) => {
                Self::Expiring { expires_at }
            }
            (Some(_), Some(expires_at)) => Self::Valid { expires_at },
            _ => Self::Unauthenticated,
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Result of one request to the token endpoint.
enum Exchange {
    Granted(TokenState),
    /// Non-200 status.
    Rejected(StatusCode),
    /// 200 with a body that is not a token response.
    Malformed(String),
    /// Transport failure or timeout.
    Unreachable(reqwest::Error),
}

// ── Token manager ────────────────────────────────────────────────────

/// Owns the token state and the logic deciding when to re-authenticate.
pub struct TokenManager {
    http: reqwest::Client,
    token_url: Url,
    credentials: Credentials,
    state: Mutex<TokenState>,
}

impl TokenManager {
    /// Create a manager with an empty token state.
    ///
    /// `token_url` is the full `/oauth/token` endpoint.
    pub fn new(http: reqwest::Client, token_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            token_url,
            credentials,
            state: Mutex::new(TokenState::default()),
        }
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    // ── Public operations ────────────────────────────────────────────

    /// Whether the held token must be replaced before the next request.
    pub async fn needs_refresh(&self) -> bool {
        self.state.lock().await.needs_refresh()
    }

    pub async fn auth_state(&self) -> AuthState {
        AuthState::of(&*self.state.lock().await, Utc::now())
    }

    /// Log in with the password grant, replacing any held tokens.
    pub async fn authenticate(&self) -> Result<TokenState, AuthError> {
        let mut state = self.state.lock().await;
        self.authenticate_locked(&mut state).await
    }

    /// Exchange the refresh token for a new pair, falling back to a full
    /// login when there is no refresh token or the server rejects it.
    pub async fn refresh(&self) -> Result<TokenState, AuthError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Refresh if the held token is missing or close to expiry.
    pub async fn ensure_valid(&self) -> Result<(), AuthError> {
        self.valid_access_token().await.map(|_| ())
    }

    /// Return an access token that is good for at least the refresh buffer,
    /// refreshing first when needed.
    pub async fn valid_access_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        if state.needs_refresh() {
            debug!("access token missing or near expiry, refreshing");
            self.refresh_locked(&mut state).await?;
        }
        current_token(&state)
    }

    /// Recover from a 401 on `rejected_token`.
    ///
    /// When the held token already differs from the rejected one, another
    /// caller has refreshed since the request was sent and the held token is
    /// returned as is. Otherwise performs one [`refresh`](Self::refresh).
    pub async fn refresh_or_reauthenticate(
        &self,
        rejected_token: &str,
    ) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        if state
            .access_token
            .as_deref()
            .is_some_and(|held| held != rejected_token)
        {
            debug!("token already replaced by a concurrent refresh");
            return current_token(&state);
        }
        self.refresh_locked(&mut state).await?;
        current_token(&state)
    }

    /// Copy of the held tokens for persistence.
    pub async fn export_tokens(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    /// Replace the held tokens with a previously exported snapshot.
    pub async fn import_tokens(&self, tokens: TokenState) {
        debug!(expires_at = ?tokens.expires_at, "importing persisted tokens");
        *self.state.lock().await = tokens;
    }

    // ── Locked helpers ───────────────────────────────────────────────

    async fn authenticate_locked(&self, state: &mut TokenState) -> Result<TokenState, AuthError> {
        debug!(username = %self.credentials.username, "authenticating with password grant");

        let form = [
            ("grant_type", "password"),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose_secret()),
        ];

        match self.exchange(&form).await {
            Exchange::Granted(tokens) => {
                info!(expires_at = ?tokens.expires_at, "authentication successful");
                *state = tokens.clone();
                Ok(tokens)
            }
            Exchange::Rejected(status)
                if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED =>
            {
                warn!(%status, "authentication rejected");
                Err(AuthError::InvalidCredentials)
            }
            Exchange::Rejected(status) => Err(AuthError::unavailable(format!(
                "token endpoint returned HTTP {status}"
            ))),
            Exchange::Malformed(reason) => Err(AuthError::unavailable(reason)),
            Exchange::Unreachable(err) => Err(err.into()),
        }
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<TokenState, AuthError> {
        let Some(refresh_token) = state.refresh_token.clone() else {
            debug!("no refresh token held, performing full authentication");
            return self.authenticate_locked(state).await;
        };

        debug!("refreshing access token");
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        match self.exchange(&form).await {
            Exchange::Granted(tokens) => {
                debug!(expires_at = ?tokens.expires_at, "token refresh successful");
                *state = tokens.clone();
                Ok(tokens)
            }
            Exchange::Rejected(status) => {
                warn!(%status, "refresh token rejected, re-authenticating");
                self.authenticate_locked(state).await
            }
            Exchange::Malformed(reason) => {
                warn!(%reason, "unusable refresh response, re-authenticating");
                self.authenticate_locked(state).await
            }
            Exchange::Unreachable(err) => Err(err.into()),
        }
    }

    async fn exchange(&self, form: &[(&str, &str)]) -> Exchange {
        let issued_at = Utc::now();
        let mut client_auth = HeaderValue::from_static(OAUTH_CLIENT_AUTHORIZATION);
        client_auth.set_sensitive(true);

        let resp = match self
            .http
            .post(self.token_url.clone())
            .header(AUTHORIZATION, client_auth)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Exchange::Unreachable(e),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            return Exchange::Rejected(status);
        }

        match resp.text().await {
            Ok(body) => match serde_json::from_str::<TokenResponse>(&body) {
                Ok(parsed) => Exchange::Granted(TokenState::from_response(parsed, issued_at)),
                Err(e) => Exchange::Malformed(format!("invalid token response: {e}")),
            },
            Err(e) => Exchange::Unreachable(e),
        }
    }
}

fn current_token(state: &TokenState) -> Result<String, AuthError> {
    state
        .access_token
        .clone()
        .ok_or_else(|| AuthError::unavailable("no access token after authentication"))
}
