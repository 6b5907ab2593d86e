//! Retry/backoff integration tests.

mod helpers;

use helpers::{client_config_with_mock, load_fixture, start_mock_server, MARKET_ID};
use morpho_liquidity_api::{ApiError, ClientConfig, MorphoApiClient, NamedChain};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a client config with fast retries for testing.
fn fast_retry_config(server: &MockServer, max_retries: u32) -> ClientConfig {
    client_config_with_mock(server)
        .with_max_retries(max_retries)
        .with_retry_base_delay_ms(10)
}

#[tokio::test]
async fn test_retry_success_after_transient_failures() {
    let server = start_mock_server().await;

    // First 2 requests return 500, third returns success
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server Error"))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    let body = load_fixture("market_targets");
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(fast_retry_config(&server, 3));

    let targets = client.get_market_targets(NamedChain::Base).await.unwrap();
    assert_eq!(targets.reallocatable_vaults.len(), 3);
}

#[tokio::test]
async fn test_retry_exhausted_returns_error() {
    let server = start_mock_server().await;

    // All requests return 500
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server Error"))
        .expect(3)
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(fast_retry_config(&server, 2));

    let result = client.get_market_snapshot(MARKET_ID, NamedChain::Base).await;
    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::Request(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_no_retry_with_zero_max_retries() {
    let server = start_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(fast_retry_config(&server, 0));

    let result = client.get_market_targets(NamedChain::Base).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = start_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let body = load_fixture("market_snapshot");
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(fast_retry_config(&server, 1));

    let snapshot = client.get_market_snapshot(MARKET_ID, NamedChain::Base).await.unwrap();
    assert_eq!(snapshot.vaults.len(), 2);
}

#[tokio::test]
async fn test_client_errors_not_retried() {
    let server = start_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(fast_retry_config(&server, 3));

    let err = client.get_market_targets(NamedChain::Base).await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_graphql_errors_not_retried() {
    let server = start_mock_server().await;

    // GraphQL errors should not be retried
    let body = r#"{"errors":[{"message":"Invalid query"}],"data":null}"#;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(fast_retry_config(&server, 3));

    let result = client.get_market_snapshot(MARKET_ID, NamedChain::Base).await;
    assert!(matches!(result, Err(ApiError::GraphQL(_))));
}
