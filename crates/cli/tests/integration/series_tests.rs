//! Integration tests for the `series` command.

use predicates::prelude::*;

use super::helpers::{
    mock_graphql_error, mock_market, morpho_cmd_with_mock, start_mock_server, MARKET_ID,
};

#[tokio::test]
async fn test_series_table_output() {
    let server = start_mock_server().await;
    mock_market(&server).await;

    morpho_cmd_with_mock(&server)
        .args(["series", "--market-id", MARKET_ID, "--chain", "base"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Percentage"))
        .stdout(predicate::str::contains("Borrow APY"))
        .stdout(predicate::str::contains("725000.00 USDC ($725.00K)"))
        .stdout(predicate::str::contains("90%"))
        .stdout(predicate::str::contains("100%").not());
}

#[tokio::test]
async fn test_series_steps_controls_rows() {
    let server = start_mock_server().await;
    mock_market(&server).await;

    // 101 points sampled every 50: rows at 0% and 50%
    let output = morpho_cmd_with_mock(&server)
        .args(["series", "--steps", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows = stdout.lines().filter(|line| line.contains(" USDC (")).count();
    // header line plus two rows
    assert_eq!(rows, 3);
    assert!(stdout.contains("50%"));
}

#[tokio::test]
async fn test_series_json_output() {
    let server = start_mock_server().await;
    mock_market(&server).await;

    let output = morpho_cmd_with_mock(&server)
        .args(["series", "--chain", "8453", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["chain"], 8453);
    assert_eq!(json["marketId"], MARKET_ID);
    assert_eq!(json["percentages"].as_array().unwrap().len(), 101);
    assert_eq!(json["utilizationSeries"].as_array().unwrap().len(), 101);
    assert_eq!(json["apySeries"].as_array().unwrap().len(), 101);
    assert_eq!(json["utilizationSeries"][100], 100.0);
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_series_graphql_error() {
    let server = start_mock_server().await;
    mock_graphql_error(&server, "Query complexity too high").await;

    morpho_cmd_with_mock(&server)
        .args(["series"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Query complexity too high"));
}
