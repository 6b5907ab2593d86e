//! Error handling tests for the API crate.

mod helpers;

use helpers::{
    client_config_with_mock, mock_graphql_error, mock_graphql_errors, mock_http_error,
    mock_null_data, mock_operation, start_mock_server, MARKET_ID, SNAPSHOT_OPERATION,
};
use morpho_liquidity_api::{ApiError, MorphoApiClient, NamedChain};
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_execute_graphql_error_single() {
    let server = start_mock_server().await;
    mock_graphql_error(&server, "Invalid query").await;

    let client = MorphoApiClient::with_config(client_config_with_mock(&server));

    match client.get_market_snapshot(MARKET_ID, NamedChain::Base).await {
        Err(ApiError::GraphQL(msg)) => assert_eq!(msg, "Invalid query"),
        other => panic!("Expected GraphQL error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_execute_graphql_error_multiple() {
    let server = start_mock_server().await;
    mock_graphql_errors(&server, &["Error 1", "Error 2", "Error 3"]).await;

    let client = MorphoApiClient::with_config(client_config_with_mock(&server));

    match client.get_market_targets(NamedChain::Base).await {
        Err(ApiError::GraphQL(msg)) => assert_eq!(msg, "Error 1; Error 2; Error 3"),
        other => panic!("Expected GraphQL error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_execute_no_data() {
    let server = start_mock_server().await;
    mock_null_data(&server).await;

    let client = MorphoApiClient::with_config(client_config_with_mock(&server));

    match client.get_market_snapshot(MARKET_ID, NamedChain::Base).await {
        Err(ApiError::Parse(msg)) => assert_eq!(msg, "No data in response"),
        other => panic!("Expected Parse error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_json() {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(client_config_with_mock(&server));

    let result = client.get_market_snapshot(MARKET_ID, NamedChain::Base).await;
    assert!(matches!(result, Err(ApiError::Request(_))));
}

#[tokio::test]
async fn test_http_error_after_retries() {
    let server = start_mock_server().await;
    mock_http_error(&server, 503).await;

    let config = client_config_with_mock(&server).with_max_retries(1);
    let client = MorphoApiClient::with_config(config);

    let result = client.get_market_targets(NamedChain::Base).await;
    assert!(matches!(result, Err(ApiError::Request(_))));
}

#[tokio::test]
async fn test_market_not_found() {
    let server = start_mock_server().await;
    mock_operation(&server, SNAPSHOT_OPERATION, "market_not_found").await;

    let client = MorphoApiClient::with_config(client_config_with_mock(&server));

    match client.get_market_snapshot(MARKET_ID, NamedChain::Base).await {
        Err(ApiError::MarketNotFound { market_id, chain_id }) => {
            assert_eq!(market_id, MARKET_ID);
            assert_eq!(chain_id, 8453);
        }
        other => panic!("Expected MarketNotFound, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_market_id_skips_network() {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let client = MorphoApiClient::with_config(client_config_with_mock(&server));

    let result = client.get_market_snapshot("0x1234", NamedChain::Base).await;
    assert!(matches!(result, Err(ApiError::InvalidMarketId(_))));
}

#[tokio::test]
async fn test_unsupported_chain() {
    let server = start_mock_server().await;
    let client = MorphoApiClient::with_config(client_config_with_mock(&server));

    let result = client.get_market_snapshot(MARKET_ID, NamedChain::Goerli).await;
    assert!(matches!(result, Err(ApiError::UnsupportedChain(5))));
}
