//! Morpho Liquidity Simulation Engine
//!
//! This crate models borrowing from a Morpho Blue market whose idle liquidity
//! may not cover the borrow, and the public allocator reallocations that
//! MetaMorpho vaults can perform to top it up.
//!
//! # Overview
//!
//! The engine allows you to:
//! - Derive liquidity, utilization and borrow APY of a market snapshot
//! - Hold markets, vaults, positions and holdings in an immutable, copy-on-write state
//! - Plan which sibling markets to drain for a borrow, under withdrawal utilization caps
//! - Apply `SupplyCollateral -> PublicReallocate* -> Borrow` bundles step by step
//! - Sweep borrow sizes from 0% to 100% of the reachable liquidity into a utilization / APY curve
//!
//! # Example
//!
//! ```rust,ignore
//! use morpho_liquidity_sim::{
//!     simulate_series, PublicAllocatorOptions, SimulationConfig, SimulationState,
//! };
//!
//! // Build a snapshot from fetched data
//! let state = SimulationState::new(timestamp)
//!     .with_market(target)
//!     .with_market(source)
//!     .with_vault(vault);
//!
//! let options = PublicAllocatorOptions::default().with_reallocatable_vault(vault_address);
//! let series = simulate_series(&state, target_id, &options, &SimulationConfig::default())?;
//!
//! for point in &series.points {
//!     println!("{:>5.1}% -> utilization {:.2}%", point.percentage, point.utilization);
//! }
//! ```

pub mod allocator;
pub mod bundle;
pub mod error;
pub mod holding;
pub mod irm;
pub mod market;
pub mod math;
pub mod operation;
pub mod position;
pub mod simulation;
pub mod state;
pub mod sweep;
pub mod vault;

// Re-export commonly used types
pub use error::{MarketId, SimError};

// Market exports
pub use market::{get_utilization, Market, MarketParams, ORACLE_PRICE_SCALE};

// Math exports
pub use math::{wad_to_percent, RoundingDirection, SECONDS_PER_YEAR, WAD};

// State exports
pub use holding::Holding;
pub use position::Position;
pub use state::SimulationState;
pub use vault::{PublicAllocatorConfig, PublicAllocatorMarketConfig, Vault, VaultMarketConfig};

// Operation exports
pub use bundle::{populate_bundle, reallocation_operations, Bundle};
pub use operation::{Operation, Withdrawal, DEFAULT_SLIPPAGE_TOLERANCE};

// Allocator exports
pub use allocator::{
    max_reallocatable, plan_reallocation, PlannedWithdrawal, PublicAllocatorOptions,
    ReallocationPlan, DEFAULT_MAX_WITHDRAWAL_UTILIZATION, DEFAULT_SUPPLY_TARGET_UTILIZATION,
};

// Simulation exports
pub use simulation::{
    max_borrowable, simulate_borrow, simulate_series, summarize_reallocation, BorrowSimulation,
    MarketFigures, ReallocationSummary, SimulationConfig, SourceMarketSimulation,
    TargetMarketSimulation, VaultWithdrawals, DEFAULT_BORROWER,
};
pub use sweep::{run_with, PointMetrics, SeriesPoint, SimulationSeries, SweepConfig};

// IRM exports
pub use irm::{
    borrow_rate_at, get_borrow_rate, w_exp, BorrowRateResult, ADJUSTMENT_SPEED, CURVE_STEEPNESS,
    INITIAL_RATE_AT_TARGET, MAX_RATE_AT_TARGET, MIN_RATE_AT_TARGET, TARGET_UTILIZATION,
};
