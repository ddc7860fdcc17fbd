// Fermax Blue API HTTP client
//
// Wraps `reqwest::Client` with bearer authentication and the one-shot
// re-authentication retry. Every request first asks the token manager for
// a valid token; a 401 triggers exactly one refresh and one replay.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{AuthState, Credentials, TokenManager, TokenState};
use crate::error::{ApiError, AuthError, body_preview};
use crate::models::{AccessId, Pairing};
use crate::response::{DoorResponse, classify_response};
use crate::transport::{TransportConfig, endpoint};

/// Number of replays allowed after a 401.
const MAX_AUTH_RETRIES: usize = 1;

const TOKEN_PATH: &[&str] = &["oauth", "token"];
const PAIRINGS_PATH: &[&str] = &["pairing", "api", "v3", "pairings", "me"];

/// Outcome of a single authorized send.
enum Attempt {
    /// The server rejected the bearer token; a refresh may help.
    Retryable401,
    /// Any other response, to be interpreted by the caller.
    Done(reqwest::Response),
}

/// Authenticated client for the Fermax Blue cloud API.
///
/// Owns the credentials and token state; one instance per account.
pub struct ApiClient {
    http: reqwest::Client,
    api_url: Url,
    pairings_url: Url,
    tokens: TokenManager,
}

impl ApiClient {
    /// Build a client for `credentials` using `transport` for timeouts,
    /// base URLs, and identity headers.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, ApiError> {
        let http = transport.build_client()?;
        Self::with_client(http, credentials, transport)
    }

    /// Wrap a pre-built `reqwest::Client` (caller manages timeouts and
    /// default headers).
    pub fn with_client(
        http: reqwest::Client,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, ApiError> {
        let token_url = endpoint(&transport.oauth_url, TOKEN_PATH)?;
        let pairings_url = endpoint(&transport.api_url, PAIRINGS_PATH)?;
        let tokens = TokenManager::new(http.clone(), token_url, credentials);
        Ok(Self {
            http,
            api_url: transport.api_url.clone(),
            pairings_url,
            tokens,
        })
    }

    /// The token manager backing this client.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    // ── Session operations ───────────────────────────────────────────

    /// Log in with the password grant, replacing any held tokens.
    pub async fn authenticate(&self) -> Result<TokenState, AuthError> {
        self.tokens.authenticate().await
    }

    /// Refresh the held token if it is missing or close to expiry.
    pub async fn ensure_valid(&self) -> Result<(), AuthError> {
        self.tokens.ensure_valid().await
    }

    pub async fn auth_state(&self) -> AuthState {
        self.tokens.auth_state().await
    }

    pub async fn export_tokens(&self) -> TokenState {
        self.tokens.export_tokens().await
    }

    pub async fn import_tokens(&self, tokens: TokenState) {
        self.tokens.import_tokens(tokens).await;
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List the intercom units paired with the account.
    ///
    /// `GET /pairing/api/v3/pairings/me`
    pub async fn list_pairings(&self) -> Result<Vec<Pairing>, ApiError> {
        debug!("listing pairings");
        let url = &self.pairings_url;
        let resp = self.send_authorized(|http| http.get(url.clone())).await?;
        let pairings: Vec<Pairing> = parse_json(require_ok(resp).await?).await?;
        debug!(count = pairings.len(), "pairings received");
        Ok(pairings)
    }

    /// Trigger the relay identified by `access_id` on `device_id`.
    ///
    /// `POST /deviceaction/api/v1/device/{device_id}/directed-opendoor`
    ///
    /// Returns `Ok(false)` only when the response body reports a failure.
    /// An ambiguous 200 body counts as success.
    pub async fn open_door(&self, device_id: &str, access_id: AccessId) -> Result<bool, ApiError> {
        let url = endpoint(
            &self.api_url,
            &[
                "deviceaction",
                "api",
                "v1",
                "device",
                device_id,
                "directed-opendoor",
            ],
        )?;
        debug!(device_id, %access_id, "opening door");

        let resp = self
            .send_authorized(|http| http.post(url.clone()).json(&access_id))
            .await?;
        let body = require_ok(resp).await?.text().await?;

        match classify_response(&body) {
            DoorResponse::Success => {
                info!(device_id, %access_id, "door opened");
                Ok(true)
            }
            DoorResponse::Failure => {
                warn!(device_id, %access_id, body = %body_preview(&body), "door open refused");
                Ok(false)
            }
            DoorResponse::Ambiguous => {
                warn!(
                    device_id,
                    %access_id,
                    body = %body_preview(&body),
                    "ambiguous open-door response, treating as success"
                );
                Ok(true)
            }
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a bearer-authenticated request, replaying it once after a 401.
    ///
    /// `build` is called once per attempt so the request can be rebuilt
    /// with the new token.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut token = self.tokens.valid_access_token().await?;

        for attempt in 0..=MAX_AUTH_RETRIES {
            match self.attempt(&build, &token).await? {
                Attempt::Done(resp) => return Ok(resp),
                Attempt::Retryable401 if attempt < MAX_AUTH_RETRIES => {
                    warn!("request rejected with 401, re-authenticating once");
                    token = self.tokens.refresh_or_reauthenticate(&token).await?;
                }
                Attempt::Retryable401 => {}
            }
        }

        warn!("request rejected again after re-authentication");
        Err(ApiError::AuthExpired)
    }

    async fn attempt<F>(&self, build: &F, token: &str) -> Result<Attempt, ApiError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let resp = build(&self.http).bearer_auth(token).send().await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Ok(Attempt::Retryable401);
        }
        Ok(Attempt::Done(resp))
    }
}

/// Turn anything but HTTP 200 into `ApiError::RequestFailed`.
async fn require_ok(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::OK {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::RequestFailed {
        status: status.as_u16(),
        body: body_preview(&body),
    })
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Deserialization {
        message: format!("{e} (body preview: {:?})", body_preview(&body)),
        body,
    })
}
