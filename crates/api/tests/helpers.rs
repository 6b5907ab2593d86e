//! Test helper utilities for API crate integration tests.

use morpho_liquidity_api::ClientConfig;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MARKET_ID: &str = "0x9103c3b4e834476c9a62ea009ba2c884ee42e94e6e314a26f04d312434191836";
pub const SNAPSHOT_OPERATION: &str = "GetMarketSnapshot";
pub const TARGETS_OPERATION: &str = "GetMarketTargets";

/// Start a mock GraphQL server.
pub async fn start_mock_server() -> MockServer {
    MockServer::start().await
}

/// Create a ClientConfig pointing to a mock server, with fast retries.
pub fn client_config_with_mock(mock: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_api_url(Url::parse(&mock.uri()).unwrap())
        .with_retry_base_delay_ms(10)
}

/// Load a fixture file as a string.
pub fn load_fixture(name: &str) -> String {
    let path = format!(
        "{}/tests/fixtures/{}.json",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {}", path))
}

/// Mock a GraphQL POST request for one operation with a fixture response.
pub async fn mock_operation(server: &MockServer, operation: &str, fixture_name: &str) {
    let body = load_fixture(fixture_name);
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mock a GraphQL error response for one operation.
pub async fn mock_operation_error(server: &MockServer, operation: &str, error_message: &str) {
    let body = format!(
        r#"{{"errors":[{{"message":"{}"}}],"data":null}}"#,
        error_message
    );
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mock both the snapshot and targets queries with the standard fixtures.
pub async fn mock_market(server: &MockServer) {
    mock_operation(server, SNAPSHOT_OPERATION, "market_snapshot").await;
    mock_operation(server, TARGETS_OPERATION, "market_targets").await;
}

/// Mock a GraphQL error response with a single error message.
pub async fn mock_graphql_error(server: &MockServer, error_message: &str) {
    let body = format!(
        r#"{{"errors":[{{"message":"{}"}}],"data":null}}"#,
        error_message
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mock a GraphQL response with multiple errors.
pub async fn mock_graphql_errors(server: &MockServer, error_messages: &[&str]) {
    let errors: Vec<String> = error_messages
        .iter()
        .map(|msg| format!(r#"{{"message":"{}"}}"#, msg))
        .collect();
    let body = format!(r#"{{"errors":[{}],"data":null}}"#, errors.join(","));
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mock an HTTP error response.
pub async fn mock_http_error(server: &MockServer, status_code: u16) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status_code).set_body_string("Internal Server Error"))
        .mount(server)
        .await;
}

/// Mock a response with null data (no errors but no data).
pub async fn mock_null_data(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":null}"#))
        .mount(server)
        .await;
}
