#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` endpoints and the 401 retry using wiremock.

use std::time::Duration;

use chrono::Utc;
use futures_util::future::join;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fermly_api::{AccessId, ApiClient, ApiError, AuthError, Credentials, TokenState, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const PAIRINGS: &str = "/pairing/api/v3/pairings/me";

async fn setup() -> (MockServer, ApiClient) {
    setup_with_timeout(Duration::from_secs(5)).await
}

async fn setup_with_timeout(timeout: Duration) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let transport =
        TransportConfig::with_base_url(Url::parse(&server.uri()).unwrap()).with_timeout(timeout);
    let credentials = Credentials::new("alice", SecretString::from("hunter2".to_string()));
    let client = ApiClient::new(credentials, &transport).unwrap();
    (server, client)
}

/// Install a token that is valid for another hour so the first request
/// goes straight to the API.
async fn with_valid_token(client: &ApiClient, access: &str) {
    client
        .import_tokens(TokenState {
            access_token: Some(access.into()),
            refresh_token: Some("refresh-1".into()),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        })
        .await;
}

fn pairings_body() -> serde_json::Value {
    json!([{
        "id": "pairing-1",
        "deviceId": "D1",
        "tag": "Lobby",
        "home": "Calle Mayor 1",
        "accessDoorMap": {
            "1": { "title": "Main", "visible": true, "accessId": { "block": 1, "subblock": 0, "number": 5 } },
            "2": { "visible": false, "accessId": { "block": 1, "subblock": 0, "number": 6 } }
        }
    }])
}

fn refresh_grant_ok(access: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access,
            "refresh_token": "refresh-2",
            "expires_in": 3600
        })))
}

fn open_door_path(device: &str) -> String {
    format!("/deviceaction/api/v1/device/{device}/directed-opendoor")
}

// ── list_pairings ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_pairings() {
    let (server, client) = setup().await;
    with_valid_token(&client, "token-1").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .and(header("authorization", "Bearer token-1"))
        .and(header("app-version", "3.2.1"))
        .and(header("phone-model", "iPad14,5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pairings_body()))
        .expect(1)
        .mount(&server)
        .await;

    let pairings = client.list_pairings().await.unwrap();

    assert_eq!(pairings.len(), 1);
    assert_eq!(pairings[0].device_id, "D1");
    assert_eq!(pairings[0].tag.as_deref(), Some("Lobby"));
    assert_eq!(pairings[0].access_door_map.len(), 2);
    assert!(!pairings[0].access_door_map["2"].visible);
}

#[tokio::test]
async fn test_list_pairings_authenticates_first() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let pairings = client.list_pairings().await.unwrap();
    assert!(pairings.is_empty());
}

#[tokio::test]
async fn test_list_pairings_retries_once_after_401() {
    let (server, client) = setup().await;
    with_valid_token(&client, "revoked").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pairings_body()))
        .expect(1)
        .mount(&server)
        .await;

    refresh_grant_ok("token-2").expect(1).mount(&server).await;

    let pairings = client.list_pairings().await.unwrap();
    assert_eq!(pairings.len(), 1);
    assert_eq!(pairings[0].id, "pairing-1");
}

#[tokio::test]
async fn test_list_pairings_second_401_is_terminal() {
    let (server, client) = setup().await;
    with_valid_token(&client, "revoked").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    refresh_grant_ok("token-2").expect(1).mount(&server).await;

    let result = client.list_pairings().await;
    assert!(
        matches!(result, Err(ApiError::AuthExpired)),
        "expected AuthExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_list_pairings_401_with_bad_credentials() {
    let (server, client) = setup().await;
    with_valid_token(&client, "revoked").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.list_pairings().await;
    assert!(
        matches!(result, Err(ApiError::Auth(AuthError::InvalidCredentials))),
        "expected InvalidCredentials, got: {result:?}"
    );
}

#[tokio::test]
async fn test_list_pairings_server_error() {
    let (server, client) = setup().await;
    with_valid_token(&client, "token-1").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.list_pairings().await.unwrap_err();
    assert!(err.is_transient());
    match err {
        ApiError::RequestFailed { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected RequestFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_pairings_malformed_body() {
    let (server, client) = setup().await;
    with_valid_token(&client, "token-1").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "devices": [] })))
        .mount(&server)
        .await;

    let result = client.list_pairings().await;
    assert!(
        matches!(result, Err(ApiError::Deserialization { .. })),
        "expected Deserialization, got: {result:?}"
    );
}

#[tokio::test]
async fn test_list_pairings_timeout_is_unreachable() {
    let (server, client) = setup_with_timeout(Duration::from_millis(200)).await;
    with_valid_token(&client, "token-1").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.list_pairings().await.unwrap_err();
    assert!(
        matches!(err, ApiError::Unreachable { timed_out: true, .. }),
        "expected a timed-out Unreachable, got: {err:?}"
    );
    assert!(err.is_timeout());
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let (server, client) = setup().await;
    with_valid_token(&client, "revoked").await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PAIRINGS))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    refresh_grant_ok("token-2").expect(1).mount(&server).await;

    let (a, b) = join(client.list_pairings(), client.list_pairings()).await;
    assert!(a.is_ok(), "first call: {a:?}");
    assert!(b.is_ok(), "second call: {b:?}");
}

// ── open_door ───────────────────────────────────────────────────────

async fn open_door_with_body(body: &str) -> Result<bool, ApiError> {
    let (server, client) = setup().await;
    with_valid_token(&client, "token-1").await;

    Mock::given(method("POST"))
        .and(path(open_door_path("D1")))
        .and(header("authorization", "Bearer token-1"))
        .and(body_json(json!({ "block": 1, "subblock": 0, "number": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    client.open_door("D1", AccessId::new(1, 0, 5)).await
}

#[tokio::test]
async fn test_open_door_affirmative_body() {
    assert!(open_door_with_body("OK puerta abierta").await.unwrap());
}

#[tokio::test]
async fn test_open_door_negative_body() {
    assert!(!open_door_with_body("KO bloqueada").await.unwrap());
}

#[tokio::test]
async fn test_open_door_ambiguous_body_is_soft_success() {
    assert!(open_door_with_body("").await.unwrap());
}

#[tokio::test]
async fn test_open_door_retries_once_after_401() {
    let (server, client) = setup().await;
    with_valid_token(&client, "revoked").await;

    Mock::given(method("POST"))
        .and(path(open_door_path("D1")))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(open_door_path("D1")))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    refresh_grant_ok("token-2").expect(1).mount(&server).await;

    assert!(client.open_door("D1", AccessId::new(1, 0, 5)).await.unwrap());
}

#[tokio::test]
async fn test_open_door_forbidden() {
    let (server, client) = setup().await;
    with_valid_token(&client, "token-1").await;

    Mock::given(method("POST"))
        .and(path(open_door_path("D1")))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let result = client.open_door("D1", AccessId::new(1, 0, 5)).await;
    assert!(
        matches!(result, Err(ApiError::RequestFailed { status: 403, .. })),
        "expected RequestFailed(403), got: {result:?}"
    );
}
