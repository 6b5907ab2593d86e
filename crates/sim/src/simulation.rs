//! Borrow simulation entry points.
//!
//! These wire the engine together for one target market: seed a hypothetical
//! borrower with ample collateral, build the `SupplyCollateral -> Borrow`
//! bundle and read the resulting figures.

use alloy_primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};

use crate::allocator::{max_reallocatable, plan_reallocation, PublicAllocatorOptions};
use crate::bundle::{populate_bundle, reallocation_operations, Bundle};
use crate::error::{MarketId, SimError};
use crate::holding::Holding;
use crate::market::Market;
use crate::math::zero_floor_sub;
use crate::operation::{Operation, Withdrawal, DEFAULT_SLIPPAGE_TOLERANCE};
use crate::position::Position;
use crate::state::SimulationState;
use crate::sweep::{run_with, PointMetrics, SimulationSeries, SweepConfig};

/// Principal injected as the hypothetical borrower.
pub const DEFAULT_BORROWER: Address = address!("7f7a70b5b584c4033cafd52219a496df9afb1af7");

/// Configuration shared by borrow and series simulations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Hypothetical borrower
    pub borrower: Address,
    /// Collateral granted to and supplied by the borrower
    pub collateral_seed: U256,
    /// Borrow slippage tolerance (WAD-scaled)
    pub slippage_tolerance: U256,
    /// Sweep settings for series simulations
    pub sweep: SweepConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            borrower: DEFAULT_BORROWER,
            collateral_seed: U256::MAX / U256::from(2),
            slippage_tolerance: DEFAULT_SLIPPAGE_TOLERANCE,
            sweep: SweepConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_borrower(mut self, borrower: Address) -> Self {
        self.borrower = borrower;
        self
    }

    pub fn with_collateral_seed(mut self, collateral_seed: U256) -> Self {
        self.collateral_seed = collateral_seed;
        self
    }

    pub fn with_slippage_tolerance(mut self, slippage_tolerance: U256) -> Self {
        self.slippage_tolerance = slippage_tolerance;
        self
    }

    pub fn with_sweep_points(mut self, points: usize) -> Self {
        self.sweep.points = points;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.sweep.parallel = parallel;
        self
    }

    /// Adds the borrower's empty position and collateral holding for `market_id`.
    pub fn seed(
        &self,
        state: &SimulationState,
        market_id: MarketId,
    ) -> Result<SimulationState, SimError> {
        let params = *state.market(&market_id)?.require_params()?;

        Ok(state
            .clone()
            .with_position(Position::empty(self.borrower, market_id))
            .with_holding(Holding::approved(
                self.borrower,
                params.collateral_token,
                self.collateral_seed,
            )))
    }

    /// The `SupplyCollateral -> Borrow` input bundle.
    pub fn borrow_inputs(&self, market_id: MarketId, assets: U256) -> Vec<Operation> {
        vec![
            Operation::SupplyCollateral {
                market_id,
                assets: self.collateral_seed,
                on_behalf: self.borrower,
            },
            Operation::Borrow {
                market_id,
                assets,
                on_behalf: self.borrower,
                receiver: self.borrower,
                slippage: self.slippage_tolerance,
            },
        ]
    }
}

/// Liquidity, borrow APY and utilization of a market, WAD-scaled where relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketFigures {
    pub liquidity: U256,
    pub borrow_apy: U256,
    pub utilization: U256,
}

impl From<&Market> for MarketFigures {
    fn from(market: &Market) -> Self {
        Self {
            liquidity: market.liquidity(),
            borrow_apy: market.borrow_apy(),
            utilization: market.utilization(),
        }
    }
}

/// Target market figures across one borrow simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMarketSimulation {
    pub pre_reallocation: MarketFigures,
    pub post_reallocation: MarketFigures,
    pub reallocated_amount: U256,
    pub post_borrow: MarketFigures,
    pub borrow_amount: U256,
}

/// A source market drained by the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMarketSimulation {
    pub market_id: MarketId,
    pub pre_reallocation: MarketFigures,
    pub post_reallocation: MarketFigures,
    pub reallocated_amount: U256,
}

/// Result of [`simulate_borrow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowSimulation {
    pub market_id: MarketId,
    pub target: TargetMarketSimulation,
    /// Source markets in order of first withdrawal
    pub sources: Vec<SourceMarketSimulation>,
    /// Executed operations, including inserted reallocations
    pub operations: Vec<Operation>,
}

impl BorrowSimulation {
    fn from_bundle(market_id: MarketId, amount: U256, bundle: &Bundle) -> Result<Self, SimError> {
        let initial = bundle.initial_state();
        let before_borrow = bundle.state_before_borrow().unwrap_or(initial);
        let last = bundle.final_state();

        let target = TargetMarketSimulation {
            pre_reallocation: initial.market(&market_id)?.into(),
            post_reallocation: before_borrow.market(&market_id)?.into(),
            reallocated_amount: bundle.reallocated_assets(),
            post_borrow: last.market(&market_id)?.into(),
            borrow_amount: amount,
        };

        let mut sources: Vec<SourceMarketSimulation> = Vec::new();
        for operation in bundle.reallocations() {
            let Operation::PublicReallocate { withdrawals, .. } = operation else {
                continue;
            };
            for withdrawal in withdrawals {
                match sources
                    .iter_mut()
                    .find(|source| source.market_id == withdrawal.market_id)
                {
                    Some(source) => source.reallocated_amount += withdrawal.amount,
                    None => sources.push(SourceMarketSimulation {
                        market_id: withdrawal.market_id,
                        pre_reallocation: initial.market(&withdrawal.market_id)?.into(),
                        post_reallocation: last.market(&withdrawal.market_id)?.into(),
                        reallocated_amount: withdrawal.amount,
                    }),
                }
            }
        }

        Ok(Self {
            market_id,
            target,
            sources,
            operations: bundle.operations().to_vec(),
        })
    }

    /// Whether liquidity was reallocated into the target
    pub fn reallocated(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// One vault's share of a reallocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultWithdrawals {
    pub vault: Address,
    pub withdrawals: Vec<Withdrawal>,
}

/// How a requested borrow would be covered by reallocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReallocationSummary {
    pub withdrawals: Vec<VaultWithdrawals>,
    pub total_reallocated: U256,
    pub liquidity_needed_from_reallocation: U256,
    pub reallocatable_liquidity: U256,
    pub is_liquidity_fully_matched: bool,
    pub liquidity_shortfall: U256,
}

/// Simulates borrowing `amount` from `market_id` with a fresh borrower.
///
/// # Errors
///
/// - [`SimError::MarketNotFound`] / [`SimError::MissingMarketParams`] for an unusable target
/// - [`SimError::InsufficientLiquidity`] when the borrow cannot be covered
pub fn simulate_borrow(
    state: &SimulationState,
    market_id: MarketId,
    amount: U256,
    options: &PublicAllocatorOptions,
    config: &SimulationConfig,
) -> Result<BorrowSimulation, SimError> {
    let seeded = config.seed(state, market_id)?;
    let bundle = populate_bundle(&config.borrow_inputs(market_id, amount), &seeded, options)?;
    BorrowSimulation::from_bundle(market_id, amount, &bundle)
}

/// Describes the reallocation a borrow of `amount` would require.
///
/// Unlike [`simulate_borrow`] this never fails for lack of liquidity; the
/// shortfall is reported instead.
pub fn summarize_reallocation(
    state: &SimulationState,
    market_id: MarketId,
    amount: U256,
    options: &PublicAllocatorOptions,
) -> Result<ReallocationSummary, SimError> {
    let liquidity = state.market(&market_id)?.liquidity();
    let need = zero_floor_sub(amount, liquidity);
    let plan = plan_reallocation(state, market_id, need, options)?;

    let withdrawals = reallocation_operations(&plan)
        .into_iter()
        .filter_map(|operation| match operation {
            Operation::PublicReallocate {
                vault, withdrawals, ..
            } => Some(VaultWithdrawals { vault, withdrawals }),
            _ => None,
        })
        .collect();

    Ok(ReallocationSummary {
        withdrawals,
        total_reallocated: plan.matched,
        liquidity_needed_from_reallocation: need,
        reallocatable_liquidity: max_reallocatable(state, market_id, options)?,
        is_liquidity_fully_matched: plan.is_fully_matched(),
        liquidity_shortfall: plan.shortfall,
    })
}

/// Idle liquidity plus everything the public allocator can bring into `market_id`.
pub fn max_borrowable(
    state: &SimulationState,
    market_id: MarketId,
    options: &PublicAllocatorOptions,
) -> Result<U256, SimError> {
    let liquidity = state.market(&market_id)?.liquidity();
    Ok(liquidity.saturating_add(max_reallocatable(state, market_id, options)?))
}

/// Sweeps borrow sizes from 0% to 100% of [`max_borrowable`].
///
/// Input errors fail the whole sweep; per-point failures degrade that point.
pub fn simulate_series(
    state: &SimulationState,
    market_id: MarketId,
    options: &PublicAllocatorOptions,
    config: &SimulationConfig,
) -> Result<SimulationSeries, SimError> {
    let seeded = config.seed(state, market_id)?;
    let max_liquidity = max_borrowable(&seeded, market_id, options)?;

    Ok(run_with(&config.sweep, max_liquidity, |amount| {
        let bundle = populate_bundle(&config.borrow_inputs(market_id, amount), &seeded, options)?;
        let market = bundle.final_state().market(&market_id)?;
        Ok(PointMetrics {
            utilization: market.utilization(),
            borrow_apy: market.borrow_apy(),
        })
    }))
}
