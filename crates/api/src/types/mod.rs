//! Type definitions for the Morpho API.

pub mod asset;
pub mod chain;
pub mod policy;
pub mod report;
pub mod scalars;
pub mod snapshot;

pub use alloy_chains::NamedChain;
pub use asset::Asset;
pub use chain::{chain_from_id, SUPPORTED_CHAINS};
pub use policy::MarketTargets;
pub use report::{ApiMetrics, MarketSimulationSeries, Reason, ReasonKind, ReallocationResult};
pub use snapshot::{
    MarketSnapshot, MarketStateForSim, SharedLiquidity, VaultAllocationForSim, VaultForSim,
};
