//! Integration tests for the `borrow` command.
//!
//! The fixture market holds 100,000 USDC of idle liquidity and can pull
//! another 625,000 USDC from two vaults' sibling markets.

use predicates::prelude::*;

use super::helpers::{
    mock_market, mock_operation, morpho_cmd_with_mock, start_mock_server, MARKET_ID,
};

#[tokio::test]
async fn test_borrow_within_idle_liquidity() {
    let server = start_mock_server().await;
    mock_market(&server).await;

    morpho_cmd_with_mock(&server)
        .args(["borrow", "--amount", "50000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Target Market"))
        .stdout(predicate::str::contains("Source Market").not())
        .stdout(predicate::str::contains(
            "Successfully simulated borrow without reallocation",
        ));
}

#[tokio::test]
async fn test_borrow_with_reallocation_table() {
    let server = start_mock_server().await;
    mock_market(&server).await;

    morpho_cmd_with_mock(&server)
        .args(["borrow", "-m", MARKET_ID, "-c", "base", "-a", "300000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("After Reallocation"))
        .stdout(predicate::str::contains("Source Market 0x2222"))
        .stdout(predicate::str::contains("200000.00 USDC"))
        .stdout(predicate::str::contains(
            "Successfully simulated borrow with reallocation",
        ));
}

#[tokio::test]
async fn test_borrow_json_output() {
    let server = start_mock_server().await;
    mock_market(&server).await;

    let output = morpho_cmd_with_mock(&server)
        .args(["borrow", "--amount", "300000", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["reason"]["type"], "success");
    assert_eq!(json["marketId"], MARKET_ID);
    assert_eq!(json["apiMetrics"]["loanAsset"]["symbol"], "USDC");
    assert!(json["reallocation"].is_object());
    assert!(json["simulation"].is_object());
}

#[tokio::test]
async fn test_borrow_beyond_reachable_liquidity() {
    let server = start_mock_server().await;
    mock_market(&server).await;

    morpho_cmd_with_mock(&server)
        .args(["borrow", "--amount", "1000000"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Fully Matched: No"))
        .stdout(predicate::str::contains("Shortfall:     275000.00 USDC"));
}

#[tokio::test]
async fn test_borrow_no_policy_does_not_reallocate() {
    let server = start_mock_server().await;
    mock_operation(&server, "GetMarketSnapshot", "market_snapshot").await;

    morpho_cmd_with_mock(&server)
        .args(["borrow", "--no-policy", "--amount", "300000", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""type": "error""#));
}

#[tokio::test]
async fn test_borrow_market_not_found() {
    let server = start_mock_server().await;
    mock_operation(&server, "GetMarketSnapshot", "market_not_found").await;

    morpho_cmd_with_mock(&server)
        .args(["borrow", "--no-policy", "--amount", "10"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Market not found"));
}
