//! Simulation entry points against live market data.
//!
//! Each entry point fetches the market snapshot and allocator policy
//! concurrently, converts the snapshot into simulation state and runs the
//! engine. The `fetch_*` variants never fail: errors are reported inside the
//! returned record.

use alloy_primitives::U256;
use morpho_liquidity_sim::{
    simulate_borrow, simulate_series, summarize_reallocation, BorrowSimulation,
    PublicAllocatorOptions, ReallocationSummary, SimulationSeries,
};

use crate::client::MorphoApiClient;
use crate::error::Result;
use crate::types::{
    ApiMetrics, MarketSimulationSeries, MarketSnapshot, NamedChain, Reason, ReallocationResult,
};

/// Converts whole loan tokens into base units.
pub fn scale_to_decimals(amount: U256, decimals: u8) -> U256 {
    if amount.is_zero() {
        return U256::ZERO;
    }
    U256::from(10)
        .checked_pow(U256::from(decimals))
        .map_or(U256::MAX, |scale| amount.saturating_mul(scale))
}

impl MorphoApiClient {
    /// Sweep borrow sizes over the market's reachable liquidity.
    pub async fn get_market_simulation_series(
        &self,
        market_id: &str,
        chain: NamedChain,
    ) -> Result<(MarketSnapshot, SimulationSeries)> {
        let (snapshot, options) = self.load_market(market_id, chain).await?;
        let state = snapshot.to_simulation_state()?;
        let series = simulate_series(
            &state,
            snapshot.market_id(),
            &options,
            &self.config().simulation,
        )?;

        tracing::info!(
            market = %market_id,
            points = series.points.len(),
            degraded = series.degraded_count(),
            initial_liquidity = %series.initial_liquidity,
            "simulated borrow series"
        );
        Ok((snapshot, series))
    }

    /// Like [`Self::get_market_simulation_series`], reporting errors in the result.
    pub async fn fetch_market_simulation_series(
        &self,
        market_id: &str,
        chain: NamedChain,
    ) -> MarketSimulationSeries {
        match self.get_market_simulation_series(market_id, chain).await {
            Ok((_, series)) => MarketSimulationSeries::from_series(chain, market_id, &series),
            Err(err) => {
                tracing::warn!(market = %market_id, error = %err, "series simulation failed");
                MarketSimulationSeries::failed(chain, market_id, &err)
            }
        }
    }

    /// Simulate borrowing `requested_liquidity` whole loan tokens from a market.
    ///
    /// Fetch and input errors produce a result with an error reason and no
    /// metrics. When only the borrow itself fails, metrics and the
    /// reallocation summary are still reported.
    pub async fn fetch_market_simulation_borrow(
        &self,
        market_id: &str,
        chain: NamedChain,
        requested_liquidity: U256,
    ) -> ReallocationResult {
        let (snapshot, options) = match self.load_market(market_id, chain).await {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(market = %market_id, error = %err, "failed to load market");
                return ReallocationResult::failed(chain, market_id, requested_liquidity, &err);
            }
        };

        let scaled = scale_to_decimals(requested_liquidity, snapshot.loan_asset.decimals);
        let outcome = self.simulate_scaled_borrow(&snapshot, &options, scaled);

        ReallocationResult {
            chain,
            market_id: market_id.to_string(),
            requested_liquidity,
            scaled_requested_liquidity: scaled,
            current_market_liquidity: outcome.current_market_liquidity,
            api_metrics: Some(ApiMetrics::from(&snapshot)),
            reallocation: outcome.reallocation,
            simulation: outcome.simulation,
            reason: outcome.reason,
        }
    }

    fn simulate_scaled_borrow(
        &self,
        snapshot: &MarketSnapshot,
        options: &PublicAllocatorOptions,
        scaled: U256,
    ) -> BorrowOutcome {
        let target = snapshot.market_id();
        let state = match snapshot.to_simulation_state() {
            Ok(state) => state,
            Err(err) => return BorrowOutcome::failed(snapshot.liquidity, None, err),
        };
        let current = state
            .market(&target)
            .map_or(snapshot.liquidity, |market| market.liquidity());

        let summary = match summarize_reallocation(&state, target, scaled, options) {
            Ok(summary) => summary,
            Err(err) => return BorrowOutcome::failed(current, None, err),
        };

        match simulate_borrow(&state, target, scaled, options, &self.config().simulation) {
            Ok(simulation) => {
                let reason = if simulation.reallocated() {
                    Reason::success("Successfully simulated borrow with reallocation")
                } else {
                    Reason::success("Successfully simulated borrow without reallocation")
                };
                BorrowOutcome {
                    current_market_liquidity: current,
                    reallocation: Some(summary),
                    simulation: Some(simulation),
                    reason,
                }
            }
            Err(err) => {
                tracing::debug!(market = %target, error = %err, "borrow simulation failed");
                BorrowOutcome::failed(current, Some(summary), err)
            }
        }
    }
}

/// Simulation figures of one borrow, before they are wrapped into a report.
struct BorrowOutcome {
    current_market_liquidity: U256,
    reallocation: Option<ReallocationSummary>,
    simulation: Option<BorrowSimulation>,
    reason: Reason,
}

impl BorrowOutcome {
    fn failed(
        current_market_liquidity: U256,
        reallocation: Option<ReallocationSummary>,
        err: impl std::fmt::Display,
    ) -> Self {
        Self {
            current_market_liquidity,
            reallocation,
            simulation: None,
            reason: Reason::error(err.to_string()),
        }
    }
}
