//! Test helper utilities for CLI integration tests.

#![allow(deprecated)] // Command::cargo_bin deprecation

use assert_cmd::Command;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MARKET_ID: &str = "0x9103c3b4e834476c9a62ea009ba2c884ee42e94e6e314a26f04d312434191836";

/// Start a mock GraphQL server.
pub async fn start_mock_server() -> MockServer {
    MockServer::start().await
}

/// Create a CLI command pointing to a mock server.
pub fn morpho_cmd_with_mock(mock: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("morpho-liquidity").unwrap();
    cmd.env("MORPHO_API_URL", mock.uri());
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Create a CLI command without mock server (for validation tests).
pub fn morpho_cmd() -> Command {
    let mut cmd = Command::cargo_bin("morpho-liquidity").unwrap();
    cmd.env_remove("MORPHO_API_URL");
    cmd
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

/// Mock one GraphQL operation with a fixture response.
pub async fn mock_operation(server: &MockServer, operation: &str, fixture_name: &str) {
    let body = load_fixture(fixture_name);
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mock the snapshot and targets queries with the standard fixtures.
pub async fn mock_market(server: &MockServer) {
    mock_operation(server, "GetMarketSnapshot", "market_snapshot").await;
    mock_operation(server, "GetMarketTargets", "market_targets").await;
}

/// Mock a GraphQL error response.
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
