//! CLI argument validation tests.
//!
//! These tests verify that the CLI properly validates arguments and provides
//! helpful error messages without requiring network access.

use predicates::prelude::*;

use super::helpers::morpho_cmd;

#[test]
fn test_help_output() {
    morpho_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("morpho-liquidity"))
        .stdout(predicate::str::contains("series"))
        .stdout(predicate::str::contains("borrow"))
        .stdout(predicate::str::contains("--no-policy"));
}

#[test]
fn test_series_help_output() {
    morpho_cmd()
        .args(["series", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--market-id"))
        .stdout(predicate::str::contains("--chain"))
        .stdout(predicate::str::contains("--steps"));
}

#[test]
fn test_borrow_help_output() {
    morpho_cmd()
        .args(["borrow", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--amount"));
}

#[test]
fn test_invalid_command() {
    morpho_cmd()
        .arg("invalid_command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_borrow_missing_amount() {
    morpho_cmd()
        .args(["borrow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_borrow_negative_amount() {
    morpho_cmd()
        .args(["borrow", "--amount", "-5"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_chain_value() {
    morpho_cmd()
        .args(["series", "--chain", "not-a-chain"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown chain"));
}

#[test]
fn test_zero_steps_rejected() {
    morpho_cmd()
        .args(["series", "--steps", "0"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_format_value() {
    morpho_cmd()
        .args(["series", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_series_invalid_market_id() {
    morpho_cmd()
        .args(["series", "--no-policy", "--market-id", "0x1234"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid market id"));
}

#[test]
fn test_borrow_unsupported_chain_reports_error() {
    morpho_cmd()
        .args(["borrow", "--no-policy", "--chain", "goerli", "--amount", "10", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""type": "error""#))
        .stdout(predicate::str::contains("Unsupported chain"));
}

#[test]
fn test_invalid_api_url() {
    morpho_cmd()
        .args(["series", "--api-url", "not a url"])
        .assert()
        .failure();
}
