//! Error types for the Morpho API client.

use morpho_liquidity_sim::SimError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when using the Morpho API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL error: {0}")]
    GraphQL(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Market not found on the requested chain.
    #[error("Market not found: {market_id} on chain {chain_id}")]
    MarketNotFound { market_id: String, chain_id: i64 },

    /// Market id is not a 32-byte hex string.
    #[error("Invalid market id: {0}")]
    InvalidMarketId(String),

    /// Chain is not served by the Morpho API.
    #[error("Unsupported chain ID: {0}")]
    UnsupportedChain(i64),

    /// Simulation engine rejected the snapshot or scenario.
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),
}

impl ApiError {
    /// Whether retrying the request may succeed.
    ///
    /// Transport failures, timeouts, 5xx and 429 responses are retryable.
    /// GraphQL errors and malformed data are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Request(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.status().is_some_and(|status| {
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                    })
            }
            _ => false,
        }
    }
}

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
