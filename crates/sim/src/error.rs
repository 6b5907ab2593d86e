//! Error types for the simulation engine.

use alloy_primitives::{Address, FixedBytes, U256};
use thiserror::Error;

/// Type alias for a 32-byte market ID
pub type MarketId = FixedBytes<32>;

/// Errors that can occur during simulation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Interest accrual was attempted with a timestamp before the last update
    #[error("Invalid interest accrual: timestamp {timestamp} is before last update {last_update}")]
    InvalidInterestAccrual { timestamp: u64, last_update: u64 },

    /// Market is not part of the simulation state
    #[error("Market {market_id} not found")]
    MarketNotFound { market_id: MarketId },

    /// Market exists but lacks the parameters required to borrow from it
    #[error("Market {market_id} is missing required parameters")]
    MissingMarketParams { market_id: MarketId },

    /// Vault is not part of the simulation state
    #[error("Vault {vault} not found")]
    VaultNotFound { vault: Address },

    /// Borrow cannot be satisfied even after reallocating every eligible source
    #[error(
        "Insufficient liquidity in market {market_id}: requested {requested}, \
         available {available}, shortfall {shortfall}"
    )]
    InsufficientLiquidity {
        market_id: MarketId,
        requested: U256,
        available: U256,
        shortfall: U256,
    },

    /// Insufficient liquidity in market
    #[error("Insufficient liquidity in market {market_id}")]
    InsufficientMarketLiquidity { market_id: MarketId },

    /// Insufficient collateral for borrow
    #[error("Insufficient collateral for user {user} in market {market_id}")]
    InsufficientCollateral { user: Address, market_id: MarketId },

    /// Principal does not hold enough of a token
    #[error("Insufficient balance of token {token} for {user}")]
    InsufficientBalance { user: Address, token: Address },

    /// Principal has not approved Morpho for enough of a token
    #[error("Insufficient allowance of token {token} for {user}")]
    InsufficientAllowance { user: Address, token: Address },

    /// Borrow minted more shares than the slippage tolerance allows
    #[error("Slippage exceeded in market {market_id}: {shares} shares minted, max {max_shares}")]
    SlippageExceeded {
        market_id: MarketId,
        shares: U256,
        max_shares: U256,
    },

    /// Market not enabled in vault
    #[error("Market {market_id} not enabled in vault {vault}")]
    MarketNotEnabled { vault: Address, market_id: MarketId },

    /// Supply cap exceeded
    #[error("Supply cap exceeded for market {market_id} in vault {vault}: cap is {cap}")]
    SupplyCapExceeded {
        vault: Address,
        market_id: MarketId,
        cap: U256,
    },

    /// Public allocator not configured
    #[error("Public allocator not configured for vault {vault}")]
    PublicAllocatorNotConfigured { vault: Address },

    /// Max inflow exceeded for public allocator
    #[error("Max inflow exceeded for market {market_id} in vault {vault}")]
    MaxInflowExceeded { vault: Address, market_id: MarketId },

    /// Max outflow exceeded for public allocator
    #[error("Max outflow exceeded for market {market_id} in vault {vault}")]
    MaxOutflowExceeded { vault: Address, market_id: MarketId },

    /// Empty withdrawals list for public reallocate
    #[error("Empty withdrawals list for vault {vault}")]
    EmptyWithdrawals { vault: Address },

    /// Deposit market included in withdrawals
    #[error("Deposit market {market_id} included in withdrawals for vault {vault}")]
    DepositMarketInWithdrawals { vault: Address, market_id: MarketId },

    /// Withdrawals not sorted
    #[error("Withdrawals not sorted for vault {vault}")]
    WithdrawalsNotSorted { vault: Address },
}

impl SimError {
    /// Returns the unmet amount when the error reports an infeasible borrow.
    pub fn shortfall(&self) -> Option<U256> {
        match self {
            SimError::InsufficientLiquidity { shortfall, .. } => Some(*shortfall),
            _ => None,
        }
    }
}
