//! Morpho Liquidity API
//!
//! Fetches Morpho Blue market snapshots from the GraphQL API, together with
//! the public allocator liquidity other vault markets can share, and runs
//! the `morpho-liquidity-sim` engine over them.
//!
//! # Example
//!
//! ```no_run
//! use morpho_liquidity_api::{MorphoApiClient, NamedChain};
//! use alloy_primitives::U256;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = MorphoApiClient::new();
//!     let market = "0x9103c3b4e834476c9a62ea009ba2c884ee42e94e6e314a26f04d312434191836";
//!
//!     // Utilization / APY curve from 0% to 100% of reachable liquidity
//!     let series = client.fetch_market_simulation_series(market, NamedChain::Base).await;
//!     if let Some(error) = &series.error {
//!         eprintln!("simulation failed: {error}");
//!     }
//!
//!     // Borrow 1,000,000 whole loan tokens, reallocating if needed
//!     let result = client
//!         .fetch_market_simulation_borrow(market, NamedChain::Base, U256::from(1_000_000))
//!         .await;
//!     println!("{}: {}", result.market_id, result.reason.message);
//! }
//! ```
//!
//! # Error Handling
//!
//! Fallible methods return [`ApiError`]. Transport failures, timeouts and
//! 5xx responses are retried with exponential backoff (see
//! [`ApiError::is_retryable`]); GraphQL errors are returned immediately.
//! A failed policy fetch falls back to the default allocator options.

pub mod client;
pub mod error;
pub mod queries;
pub mod simulation;
pub mod types;

// Re-export main types at crate root
pub use client::{
    ClientConfig, MorphoApiClient, DEFAULT_API_URL, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BASE_DELAY_MS,
};
pub use error::{ApiError, Result};
pub use simulation::scale_to_decimals;
pub use types::{
    chain_from_id, ApiMetrics, Asset, MarketSimulationSeries, MarketSnapshot, MarketStateForSim,
    MarketTargets, NamedChain, Reason, ReasonKind, ReallocationResult, SharedLiquidity,
    VaultAllocationForSim, VaultForSim, SUPPORTED_CHAINS,
};

// Re-export the engine so consumers need a single dependency
pub use morpho_liquidity_sim as sim;
