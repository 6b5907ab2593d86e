//! Simulated operations.
//!
//! Each [`Operation`] is a pure transformation of a
//! [`SimulationState`](crate::state::SimulationState): applying it yields exactly
//! one successor state or an error.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::MarketId;

/// Default borrow slippage tolerance (0.03%, WAD-scaled)
pub const DEFAULT_SLIPPAGE_TOLERANCE: U256 = U256::from_limbs([300_000_000_000_000, 0, 0, 0]);

/// One withdrawal leg of a public reallocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Market the vault withdraws from
    pub market_id: MarketId,
    /// Assets withdrawn
    pub amount: U256,
}

/// A simulated action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    /// Pull collateral from `on_behalf`'s holding into its position.
    SupplyCollateral {
        market_id: MarketId,
        assets: U256,
        on_behalf: Address,
    },
    /// Borrow loan assets against `on_behalf`'s position and send them to `receiver`.
    Borrow {
        market_id: MarketId,
        assets: U256,
        on_behalf: Address,
        receiver: Address,
        /// Maximum extra borrow shares accepted, WAD-scaled
        slippage: U256,
    },
    /// Move a vault's supply from source markets into `target_market_id`.
    PublicReallocate {
        vault: Address,
        target_market_id: MarketId,
        withdrawals: Vec<Withdrawal>,
    },
}

impl Operation {
    /// Total assets reallocated by this operation, zero for other kinds.
    pub fn reallocated_assets(&self) -> U256 {
        match self {
            Operation::PublicReallocate { withdrawals, .. } => withdrawals
                .iter()
                .fold(U256::ZERO, |acc, withdrawal| acc + withdrawal.amount),
            _ => U256::ZERO,
        }
    }
}
