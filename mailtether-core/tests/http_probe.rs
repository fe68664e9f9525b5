//! Integration tests for the HTTP probe client against a mock server.
//!
//! These tests verify the production factory end to end:
//! - Probe requests hit the expected endpoint with bearer authentication
//! - Response statuses map onto the fault taxonomy
//! - Unreachable hosts surface as network faults
//! - The resolver and the full connection test work against a live socket

use std::sync::Arc;

use mailtether_core::{
    resolve_probe, ApiClientFactory, ApiConfig, ApiCredentials, ApiFault, ConnectionState,
    ConstructorStyle, HttpApiFactory, LocalPasswordIssuer, MemoryOptionStore, OperatorGate,
    OutcomeCode, OwnerId, Secret, SettingsService, PROBE_CANDIDATES,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to assemble credentials pointing at a mock server.
fn credentials_for(server_uri: &str) -> ApiCredentials {
    let config = ApiConfig::from_host_str(&format!("{}/v1", server_uri)).unwrap();
    ApiCredentials {
        host: config.api_host,
        token: Secret::new("mm_live_abc"),
    }
}

/// Helper to construct the account probe client.
fn account_api(credentials: &ApiCredentials) -> Box<dyn mailtether_core::ProbeApi> {
    HttpApiFactory::new()
        .construct("account", ConstructorStyle::ConfiguredTransport, credentials)
        .expect("account resource should construct")
}

#[tokio::test]
async fn test_probe_hits_endpoint_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .and(header("authorization", "Bearer mm_live_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "name": "Acme Newsletters"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = credentials_for(&server.uri());
    let api = account_api(&credentials);

    let result = api.call("get_account").await;
    assert!(result.is_ok(), "Probe should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_unauthorized_response_maps_to_status_fault() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let credentials = credentials_for(&server.uri());
    let api = account_api(&credentials);

    let fault = api.call("get_account").await.unwrap_err();
    match fault {
        ApiFault::Status { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("invalid token"));
        }
        other => panic!("Expected a status fault, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_maps_to_status_fault() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let credentials = credentials_for(&server.uri());
    let api = account_api(&credentials);

    let fault = api.call("get_account").await.unwrap_err();
    assert!(matches!(fault, ApiFault::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_unreachable_host_maps_to_network_fault() {
    // Let the server allocate a port, then shut it down. A bare (non-pooled)
    // server is required: pooled `MockServer::start()` servers keep listening
    // after drop, so the port would still answer.
    let dead_uri = {
        let server = MockServer::builder().start().await;
        server.uri()
    };

    let credentials = credentials_for(&dead_uri);
    let api = account_api(&credentials);

    let fault = api.call("get_account").await.unwrap_err();
    assert!(
        matches!(fault, ApiFault::Network { .. }),
        "Connect failures should be network faults, got: {:?}",
        fault
    );
}

#[tokio::test]
async fn test_resolver_picks_account_probe() {
    let credentials = credentials_for("http://localhost:9");
    let factory = HttpApiFactory::new();

    let resolved = resolve_probe(&factory, PROBE_CANDIDATES, &credentials).unwrap();
    assert_eq!(
        resolved.method, "get_account",
        "The first candidate should resolve with its first method"
    );
}

/// Helper to build the full settings surface against a mock server.
fn service_against(
    server_uri: &str,
) -> SettingsService<
    MemoryOptionStore,
    HttpApiFactory,
    LocalPasswordIssuer<MemoryOptionStore>,
    OperatorGate,
> {
    let store = Arc::new(MemoryOptionStore::new());
    let issuer = Arc::new(LocalPasswordIssuer::new(Arc::clone(&store)));
    SettingsService::new(
        store,
        Arc::new(HttpApiFactory::new()),
        issuer,
        OperatorGate::new(Some(OwnerId::new(1))),
        ApiConfig::from_host_str(&format!("{}/v1", server_uri)).unwrap(),
    )
}

#[tokio::test]
async fn test_full_connection_test_against_live_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .mount(&server)
        .await;

    let service = service_against(&server.uri());
    service.save_token("mm_live_abc").await.unwrap();

    let outcome = service.test_connection().await.unwrap();
    assert_eq!(outcome, OutcomeCode::ConnectionSuccess);

    let status = service.connection_status().await.unwrap();
    assert_eq!(status.state, ConnectionState::Connected);
}

#[tokio::test]
async fn test_full_connection_test_against_refusing_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let service = service_against(&server.uri());
    service.save_token("mm_live_revoked").await.unwrap();

    let outcome = service.test_connection().await.unwrap();
    assert_eq!(outcome, OutcomeCode::ConnectionFailed);

    let status = service.connection_status().await.unwrap();
    assert_eq!(status.state, ConnectionState::NotConnected);
    assert!(status.message.contains("Unauthorized"));
}
