#![allow(clippy::unwrap_used)]
// Integration tests for `Session` using wiremock.

use std::time::Duration;

use futures_util::future::join_all;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use petlibro_api::{
    ApiClient, Credentials, Error, ERROR_NOT_LOGGED_IN, Session, SessionConfig, TransportConfig,
};

const LOGIN: &str = "/member/auth/login";
const REAL_INFO: &str = "/device/device/realInfo";

// ── Helpers ─────────────────────────────────────────────────────────

fn session_for(server: &MockServer, token: Option<&str>, timeout: Duration) -> Session {
    let transport = TransportConfig::with_base_url(&server.uri())
        .unwrap()
        .with_timeout(timeout);
    Session::new(SessionConfig {
        transport,
        credentials: Credentials::new("owner@example.com", "secret", "US", "Europe/Amsterdam"),
        token: token.map(String::from),
    })
    .unwrap()
}

async fn setup(token: Option<&str>) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let session = session_for(&server, token, Duration::from_secs(15));
    (server, ApiClient::new(session))
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": "success", "data": data }))
}

fn fail(code: i64, msg: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": code, "msg": msg, "data": null }))
}

fn expired() -> ResponseTemplate {
    fail(ERROR_NOT_LOGGED_IN, "NOT_YET_LOGIN")
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_stores_token() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .and(body_partial_json(json!({
            "appId": 1,
            "appSn": "c35772530d1041699c87fe62348507a8",
            "country": "US",
            "email": "owner@example.com",
            "password": "5ebe2294ecd0e0f08eab7690d2a6ee69",
            "timezone": "Europe/Amsterdam",
            "thirdId": null,
            "type": null
        })))
        .respond_with(ok(json!({ "token": "tok-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let secret = SecretString::from("secret".to_string());
    let token = client.login("owner@example.com", &secret).await.unwrap();

    assert_eq!(token, "tok-1");
    assert_eq!(client.session().token().as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_login_updates_credentials() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ok(json!({ "token": "tok-2" })))
        .mount(&server)
        .await;

    let secret = SecretString::from("other".to_string());
    client.login("second@example.com", &secret).await.unwrap();

    assert_eq!(client.session().credentials().email, "second@example.com");
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(fail(1002, "Incorrect account or password"))
        .mount(&server)
        .await;

    let secret = SecretString::from("wrong".to_string());
    let result = client.login("owner@example.com", &secret).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("Incorrect"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert_eq!(client.session().token(), None);
}

#[tokio::test]
async fn test_login_without_token_is_deserialization_error() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ok(json!({})))
        .mount(&server)
        .await;

    let secret = SecretString::from("secret".to_string());
    let result = client.login("owner@example.com", &secret).await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Headers ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_vendor_headers_sent_with_token() {
    let (server, client) = setup(Some("tok-h")).await;

    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .and(header("content-type", "application/json"))
        .and(header("source", "ANDROID"))
        .and(header("language", "EN"))
        .and(header("timezone", "Europe/Amsterdam"))
        .and(header("version", "1.3.45"))
        .and(header("token", "tok-h"))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_token_rotation_picked_up_per_call() {
    let (server, client) = setup(Some("first")).await;

    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .and(header("token", "second"))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client.session().set_token("second");
    client.list_devices().await.unwrap();
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_api_error_fails_without_retry() {
    let (server, client) = setup(Some("tok")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .respond_with(fail(1001, "device not found"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ok(json!({ "token": "never" })))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.device_real_info("AF0001").await;

    match result {
        Err(Error::Api { code, ref message }) => {
            assert_eq!(code, 1001);
            assert_eq!(message, "device not found");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup(Some("tok")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = client.device_real_info("AF0001").await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => {
            assert!(body.contains("Bad Gateway"));
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_aborts_request() {
    let server = MockServer::start().await;
    let client = ApiClient::new(session_for(&server, Some("tok"), Duration::from_millis(200)));

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .respond_with(ok(json!({ "online": true })).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let result = client.device_real_info("AF0001").await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got: {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let transport = TransportConfig::with_base_url("http://127.0.0.1:1").unwrap();
    let session = Session::new(SessionConfig {
        transport,
        credentials: Credentials::new("owner@example.com", "secret", "US", "UTC"),
        token: Some("tok".into()),
    })
    .unwrap();

    let result = ApiClient::new(session).list_devices().await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_transient());
}

// ── Re-authentication ───────────────────────────────────────────────

#[tokio::test]
async fn test_sentinel_triggers_relogin_and_single_retry() {
    let (server, client) = setup(Some("stale")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "stale"))
        .respond_with(expired())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .and(body_partial_json(json!({ "email": "owner@example.com" })))
        .respond_with(ok(json!({ "token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "fresh"))
        .respond_with(ok(json!({ "deviceSn": "AF0001", "online": true, "electricQuantity": 80 })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client.device_real_info("AF0001").await.unwrap();

    // Payload comes from the retry, not the failed first response.
    assert_eq!(info.electric_quantity, Some(80));
    assert!(info.is_online());
    assert_eq!(client.session().token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_sentinel_on_retry_surfaces_api_error() {
    let (server, client) = setup(Some("stale")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .respond_with(expired())
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ok(json!({ "token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.device_real_info("AF0001").await;

    assert!(
        matches!(result, Err(Error::Api { code: ERROR_NOT_LOGGED_IN, .. })),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_relogin_failure_propagates() {
    let (server, client) = setup(Some("stale")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .respond_with(expired())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(fail(1002, "password changed"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.device_real_info("AF0001").await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert_eq!(client.session().token().as_deref(), Some("stale"));
}

#[tokio::test]
async fn test_relogin_completes_after_waiter_is_dropped() {
    let (server, client) = setup(Some("stale")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "stale"))
        .respond_with(expired())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ok(json!({ "token": "fresh" })).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "fresh"))
        .respond_with(ok(json!({ "online": true })))
        .expect(1)
        .mount(&server)
        .await;

    // Abandon the only caller while its re-login is still in flight.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(80), client.device_real_info("AF0001")).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(client.session().token().as_deref(), Some("fresh"));

    // The next call goes straight through with the new token.
    let info = client.device_real_info("AF0001").await.unwrap();
    assert!(info.is_online());
}

#[tokio::test]
async fn test_concurrent_sentinels_coalesce_into_one_login() {
    const CONCURRENT: u64 = 8;
    let (server, client) = setup(Some("stale")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "stale"))
        .respond_with(expired())
        .expect(CONCURRENT)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ok(json!({ "token": "fresh" })).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "fresh"))
        .respond_with(ok(json!({ "online": true })))
        .expect(CONCURRENT)
        .mount(&server)
        .await;

    let calls = (0..CONCURRENT).map(|i| {
        let client = client.clone();
        async move { client.device_real_info(&format!("AF{i:04}")).await }
    });
    let results = join_all(calls).await;

    for result in results {
        assert!(result.unwrap().is_online());
    }
    assert_eq!(client.session().token().as_deref(), Some("fresh"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coalescing_across_spawned_tasks() {
    let (server, client) = setup(Some("stale")).await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "stale"))
        .respond_with(expired())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ok(json!({ "token": "fresh" })).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REAL_INFO))
        .and(header("token", "fresh"))
        .respond_with(ok(json!({ "online": true })))
        .mount(&server)
        .await;

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.device_real_info("AF0001").await })
        })
        .collect();

    for handle in handles {
        tokio_test::assert_ok!(handle.await.unwrap());
    }
}
