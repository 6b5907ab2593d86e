//! Morpho API client for market snapshots and public allocator policy.

use std::time::Duration;

use graphql_client::{GraphQLQuery, QueryBody, Response};
use morpho_liquidity_sim::{MarketId, PublicAllocatorOptions, SimulationConfig};
use reqwest::Client;
use url::Url;

use crate::error::{ApiError, Result};
use crate::queries::market::{get_market_snapshot, GetMarketSnapshot};
use crate::queries::targets::{get_market_targets, GetMarketTargets};
use crate::types::chain::{chain_id, is_supported};
use crate::types::scalars::parse_market_id;
use crate::types::{MarketSnapshot, MarketTargets, NamedChain};

/// Default Morpho GraphQL API endpoint.
pub const DEFAULT_API_URL: &str = "https://blue-api.morpho.org/graphql";

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry; doubles on every attempt.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 250;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL API URL.
    pub api_url: Url,
    /// Retries after the first attempt for transport and 5xx failures.
    pub max_retries: u32,
    /// Base delay of the exponential backoff.
    pub retry_base_delay_ms: u64,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Fetch per-market utilization targets and whitelisted vaults.
    /// When disabled, the engine defaults are used and nothing is reallocated.
    pub fetch_policy: bool,
    /// Borrower, slippage and sweep settings.
    pub simulation: SimulationConfig,
}

impl Default for ClientConfig {
    #[expect(clippy::expect_used, reason = "the default URL is a valid constant")]
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("Invalid default API URL"),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fetch_policy: true,
            simulation: SimulationConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom API URL.
    pub fn with_api_url(mut self, url: Url) -> Self {
        self.api_url = url;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_fetch_policy(mut self, fetch_policy: bool) -> Self {
        self.fetch_policy = fetch_policy;
        self
    }

    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(factor))
    }
}

/// Client for the Morpho Blue GraphQL API.
#[derive(Debug, Clone)]
pub struct MorphoApiClient {
    http_client: Client,
    config: ClientConfig,
}

impl Default for MorphoApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MorphoApiClient {
    /// Create a new client with default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a GraphQL query, retrying transient failures with exponential backoff.
    ///
    /// GraphQL errors and malformed responses fail immediately.
    async fn execute<Q: GraphQLQuery>(&self, variables: Q::Variables) -> Result<Q::ResponseData> {
        let request_body = Q::build_query(variables);
        let mut attempt = 0;

        loop {
            match self.execute_once::<Q>(&request_body).await {
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        operation = request_body.operation_name,
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying Morpho API request"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn execute_once<Q: GraphQLQuery>(
        &self,
        request_body: &QueryBody<Q::Variables>,
    ) -> Result<Q::ResponseData> {
        let response = self
            .http_client
            .post(self.config.api_url.as_str())
            .json(request_body)
            .send()
            .await?
            .error_for_status()?;

        let response_body: Response<Q::ResponseData> = response.json().await?;

        if let Some(errors) = response_body.errors {
            if !errors.is_empty() {
                return Err(ApiError::GraphQL(
                    errors
                        .iter()
                        .map(|e| e.message.clone())
                        .collect::<Vec<_>>()
                        .join("; "),
                ));
            }
        }

        response_body
            .data
            .ok_or_else(|| ApiError::Parse("No data in response".to_string()))
    }

    /// Check a market id and chain before touching the network.
    pub fn validate(market_id: &str, chain: NamedChain) -> Result<MarketId> {
        if !is_supported(chain) {
            return Err(ApiError::UnsupportedChain(chain_id(chain)));
        }
        parse_market_id(market_id).ok_or_else(|| ApiError::InvalidMarketId(market_id.to_string()))
    }

    /// Get a market with its public allocator shared liquidity.
    pub async fn get_market_snapshot(
        &self,
        market_id: &str,
        chain: NamedChain,
    ) -> Result<MarketSnapshot> {
        let id = Self::validate(market_id, chain)?;
        let variables = get_market_snapshot::Variables {
            unique_key: market_id.to_string(),
            chain_id: chain_id(chain),
        };

        let data = self.execute::<GetMarketSnapshot>(variables).await?;
        let not_found = || ApiError::MarketNotFound {
            market_id: market_id.to_string(),
            chain_id: chain_id(chain),
        };

        let market = data.market_by_unique_key.ok_or_else(not_found)?;
        let snapshot = MarketSnapshot::from_gql(market, chain).ok_or_else(|| {
            ApiError::Parse(format!("Invalid market data for {}", market_id))
        })?;
        if snapshot.market_id() != id {
            return Err(not_found());
        }

        tracing::debug!(
            market = %market_id,
            sources = snapshot.sources.len(),
            vaults = snapshot.vaults.len(),
            timestamp = snapshot.timestamp(),
            "fetched market snapshot"
        );
        Ok(snapshot)
    }

    /// Get utilization targets and whitelisted vaults on a chain.
    pub async fn get_market_targets(&self, chain: NamedChain) -> Result<MarketTargets> {
        if !is_supported(chain) {
            return Err(ApiError::UnsupportedChain(chain_id(chain)));
        }
        let variables = get_market_targets::Variables {
            chain_id: chain_id(chain),
        };
        let data = self.execute::<GetMarketTargets>(variables).await?;
        Ok(MarketTargets::from_gql(data))
    }

    /// Allocator options for `chain`.
    ///
    /// A failed policy fetch is not fatal: the engine defaults are used, with
    /// no reallocatable vaults.
    pub async fn get_allocator_options(&self, chain: NamedChain) -> PublicAllocatorOptions {
        if !self.config.fetch_policy {
            return PublicAllocatorOptions::default();
        }
        match self.get_market_targets(chain).await {
            Ok(targets) => targets.to_allocator_options(),
            Err(err) => {
                tracing::warn!(
                    chain = %chain,
                    error = %err,
                    "failed to fetch market targets, using default allocator policy"
                );
                PublicAllocatorOptions::default()
            }
        }
    }

    /// Fetch the snapshot and the allocator policy concurrently.
    pub async fn load_market(
        &self,
        market_id: &str,
        chain: NamedChain,
    ) -> Result<(MarketSnapshot, PublicAllocatorOptions)> {
        let (snapshot, options) = tokio::join!(
            self.get_market_snapshot(market_id, chain),
            self.get_allocator_options(chain),
        );
        Ok((snapshot?, options))
    }
}
