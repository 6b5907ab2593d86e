//! Integration tests for the Morpho Liquidity CLI.
//!
//! These tests verify the full command execution path with mocked API responses.
//!
//! # Test Categories
//!
//! - **Simulation command tests**: `series` and `borrow` against wiremock
//! - **CLI validation tests**: Argument parsing, help text, error handling
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p morpho-liquidity-cli --test integration
//! ```

mod integration {
    pub mod helpers;
    pub mod cli_validation_tests;
    pub mod borrow_tests;
    pub mod series_tests;
}
