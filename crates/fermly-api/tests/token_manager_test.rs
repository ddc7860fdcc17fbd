#![allow(clippy::unwrap_used)]
// Integration tests for token acquisition and refresh using wiremock.

use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fermly_api::{ApiClient, AuthError, AuthState, Credentials, TokenState, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    setup_with(|t| t).await
}

async fn setup_with(
    tweak: impl FnOnce(TransportConfig) -> TransportConfig,
) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let transport = tweak(TransportConfig::with_base_url(
        Url::parse(&server.uri()).unwrap(),
    ));
    let credentials = Credentials::new("alice", SecretString::from("hunter2".to_string()));
    let client = ApiClient::new(credentials, &transport).unwrap();
    (server, client)
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": 3600,
        "scope": "read write"
    })
}

fn password_grant() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=password"))
}

fn refresh_grant() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
}

fn tokens_without_refresh() -> TokenState {
    TokenState {
        access_token: Some("expired".into()),
        refresh_token: None,
        expires_at: Some(Utc::now() - chrono::Duration::minutes(1)),
    }
}

fn expired_tokens() -> TokenState {
    TokenState {
        access_token: Some("expired".into()),
        refresh_token: Some("refresh-1".into()),
        expires_at: Some(Utc::now() - chrono::Duration::minutes(1)),
    }
}

// ── Password grant ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_success() {
    let (server, client) = setup().await;

    password_grant()
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=hunter2"))
        .and(header_exists("authorization"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1", "refresh-1")))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let tokens = client.authenticate().await.unwrap();
    let after = Utc::now();

    assert_eq!(tokens.access_token.as_deref(), Some("access-1"));
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));

    let expires_at = tokens.expires_at.unwrap();
    assert!(expires_at >= before + chrono::Duration::seconds(3600));
    assert!(expires_at <= after + chrono::Duration::seconds(3600));

    assert_eq!(client.export_tokens().await, tokens);
    assert!(matches!(client.auth_state().await, AuthState::Valid { .. }));
}

#[tokio::test]
async fn test_authenticate_defaults_expires_in() {
    let (server, client) = setup().await;

    password_grant()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "a" })))
        .mount(&server)
        .await;

    let before = Utc::now();
    let tokens = client.authenticate().await.unwrap();

    let lifetime = tokens.expires_at.unwrap() - before;
    assert!(lifetime >= chrono::Duration::seconds(3600));
    assert!(lifetime < chrono::Duration::seconds(3660));
    assert!(tokens.refresh_token.is_none());
}

#[tokio::test]
async fn test_authenticate_rejected_credentials() {
    for status in [400, 401] {
        let (server, client) = setup().await;

        password_grant()
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "error": "invalid_grant" })),
            )
            .mount(&server)
            .await;

        let result = client.authenticate().await;
        assert_eq!(result, Err(AuthError::InvalidCredentials), "HTTP {status}");
        assert_eq!(client.auth_state().await, AuthState::Unauthenticated);
    }
}

#[tokio::test]
async fn test_authenticate_server_error_is_unavailable() {
    let (server, client) = setup().await;

    password_grant()
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client.authenticate().await;
    assert!(
        matches!(result, Err(AuthError::Unavailable { timed_out: false, .. })),
        "expected Unavailable, got: {result:?}"
    );
}

#[tokio::test]
async fn test_authenticate_malformed_body_is_unavailable() {
    let (server, client) = setup().await;

    password_grant()
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client.authenticate().await;
    assert!(matches!(result, Err(AuthError::Unavailable { .. })));
}

#[tokio::test]
async fn test_authenticate_timeout_is_unavailable() {
    let (server, client) =
        setup_with(|t| t.with_timeout(Duration::from_millis(200))).await;

    password_grant()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("a", "r"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.authenticate().await.unwrap_err();
    assert!(err.is_timeout(), "expected a timeout, got: {err:?}");
    assert!(matches!(err, AuthError::Unavailable { timed_out: true, .. }));
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_without_refresh_token_authenticates() {
    let (server, client) = setup().await;
    client.import_tokens(tokens_without_refresh()).await;

    refresh_grant()
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("x", "y")))
        .expect(0)
        .mount(&server)
        .await;

    password_grant()
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = client.tokens().refresh().await.unwrap();
    assert_eq!(tokens.access_token.as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_refresh_without_refresh_token_fails_like_authenticate() {
    let (server, client) = setup().await;

    password_grant()
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let via_refresh = client.tokens().refresh().await;
    let via_authenticate = client.authenticate().await;
    assert_eq!(via_refresh, via_authenticate);
    assert_eq!(via_refresh, Err(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_refresh_uses_refresh_token() {
    let (server, client) = setup().await;
    client.import_tokens(expired_tokens()).await;

    refresh_grant()
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    password_grant()
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("x", "y")))
        .expect(0)
        .mount(&server)
        .await;

    let tokens = client.tokens().refresh().await.unwrap();
    assert_eq!(tokens.access_token.as_deref(), Some("access-2"));
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_rejected_refresh_falls_back_to_password_grant() {
    let (server, client) = setup().await;
    client.import_tokens(expired_tokens()).await;

    refresh_grant()
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .expect(1)
        .mount(&server)
        .await;

    password_grant()
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-3", "refresh-3")))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = client.tokens().refresh().await.unwrap();
    assert_eq!(tokens.access_token.as_deref(), Some("access-3"));
}

// ── ensure_valid ────────────────────────────────────────────────────

#[tokio::test]
async fn test_ensure_valid_is_noop_for_fresh_token() {
    let (server, client) = setup().await;
    client
        .import_tokens(TokenState {
            access_token: Some("fresh".into()),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc::now() + chrono::Duration::minutes(30)),
        })
        .await;

    Mock::given(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("x", "y")))
        .expect(0)
        .mount(&server)
        .await;

    client.ensure_valid().await.unwrap();
    assert!(!client.tokens().needs_refresh().await);
}

#[tokio::test]
async fn test_ensure_valid_refreshes_inside_buffer() {
    let (server, client) = setup().await;
    client
        .import_tokens(TokenState {
            access_token: Some("stale".into()),
            refresh_token: Some("refresh-1".into()),
            expires_at: Some(Utc::now() + chrono::Duration::minutes(4)),
        })
        .await;

    refresh_grant()
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    client.ensure_valid().await.unwrap();
    let tokens = client.export_tokens().await;
    assert_eq!(tokens.access_token.as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_concurrent_ensure_valid_is_single_flight() {
    let (server, client) = setup().await;

    password_grant()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("access-1", "refresh-1"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let results = join_all((0..8).map(|_| client.ensure_valid())).await;
    assert!(results.iter().all(Result::is_ok), "results: {results:?}");

    let token_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/oauth/token")
        .count();
    assert_eq!(token_calls, 1);
}
