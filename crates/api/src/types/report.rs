//! Result records returned by the simulation entry points.

use alloy_chains::NamedChain;
use alloy_primitives::U256;
use morpho_liquidity_sim::{BorrowSimulation, ReallocationSummary, SimulationSeries};
use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::chain::chain_serde;
use super::snapshot::{MarketSnapshot, SharedLiquidity};
use crate::error::ApiError;

/// Outcome of a borrow simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasonKind {
    Success,
    Error,
}

/// Outcome with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    #[serde(rename = "type")]
    pub kind: ReasonKind,
    pub message: String,
}

impl Reason {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ReasonKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ReasonKind::Error,
            message: message.into(),
        }
    }
}

/// Market figures as reported by the API, before simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetrics {
    pub current_market_liquidity: U256,
    pub reallocatable_liquidity: U256,
    /// WAD-scaled.
    pub utilization: U256,
    /// WAD-scaled.
    pub lltv: U256,
    pub loan_asset: Asset,
    pub collateral_asset: Option<Asset>,
    pub public_allocator_shared_liquidity: Vec<SharedLiquidity>,
}

impl From<&MarketSnapshot> for ApiMetrics {
    fn from(snapshot: &MarketSnapshot) -> Self {
        Self {
            current_market_liquidity: snapshot.liquidity,
            reallocatable_liquidity: snapshot.reallocatable_liquidity,
            utilization: snapshot.utilization,
            lltv: snapshot
                .target
                .params
                .map(|params| params.lltv)
                .unwrap_or_default(),
            loan_asset: snapshot.loan_asset.clone(),
            collateral_asset: snapshot.collateral_asset.clone(),
            public_allocator_shared_liquidity: snapshot.shared_liquidity.clone(),
        }
    }
}

/// Full result of simulating one borrow against a live market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReallocationResult {
    #[serde(with = "chain_serde")]
    pub chain: NamedChain,
    pub market_id: String,
    /// Requested amount in whole loan tokens.
    pub requested_liquidity: U256,
    /// Requested amount in loan token base units.
    pub scaled_requested_liquidity: U256,
    /// Idle liquidity of the target at the snapshot timestamp.
    pub current_market_liquidity: U256,
    pub api_metrics: Option<ApiMetrics>,
    pub reallocation: Option<ReallocationSummary>,
    pub simulation: Option<BorrowSimulation>,
    pub reason: Reason,
}

impl ReallocationResult {
    /// A result carrying only the error.
    pub fn failed(
        chain: NamedChain,
        market_id: &str,
        requested_liquidity: U256,
        err: &ApiError,
    ) -> Self {
        Self {
            chain,
            market_id: market_id.to_string(),
            requested_liquidity,
            scaled_requested_liquidity: U256::ZERO,
            current_market_liquidity: U256::ZERO,
            api_metrics: None,
            reallocation: None,
            simulation: None,
            reason: Reason::error(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.reason.kind == ReasonKind::Success
    }
}

/// Utilization and APY curve of a market over borrow sizes, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSimulationSeries {
    #[serde(with = "chain_serde")]
    pub chain: NamedChain,
    pub market_id: String,
    pub percentages: Vec<f64>,
    pub initial_liquidity: U256,
    pub utilization_series: Vec<f64>,
    pub apy_series: Vec<f64>,
    pub borrow_amounts: Vec<U256>,
    /// Points that carried the previous values forward after a failure.
    pub degraded: Vec<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarketSimulationSeries {
    pub fn from_series(chain: NamedChain, market_id: &str, series: &SimulationSeries) -> Self {
        Self {
            chain,
            market_id: market_id.to_string(),
            percentages: series.percentages(),
            initial_liquidity: series.initial_liquidity,
            utilization_series: series.utilization_series(),
            apy_series: series.apy_series(),
            borrow_amounts: series.borrow_amounts(),
            degraded: series.degraded(),
            error: None,
        }
    }

    /// An empty series carrying the error message.
    pub fn failed(chain: NamedChain, market_id: &str, err: &ApiError) -> Self {
        Self {
            chain,
            market_id: market_id.to_string(),
            percentages: Vec::new(),
            initial_liquidity: U256::ZERO,
            utilization_series: Vec::new(),
            apy_series: Vec::new(),
            borrow_amounts: Vec::new(),
            degraded: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.percentages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty()
    }
}
