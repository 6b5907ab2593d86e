//! Borrower positions in Morpho Blue markets.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{MarketId, SimError};
use crate::market::Market;
use crate::math::RoundingDirection;

/// Represents a user's position in a Morpho Blue market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// The user holding this position
    pub user: Address,
    /// The market ID
    pub market_id: MarketId,
    /// Amount of supply shares held
    pub supply_shares: U256,
    /// Amount of borrow shares held
    pub borrow_shares: U256,
    /// Amount of collateral assets held
    pub collateral: U256,
}

impl Position {
    /// Create an empty position
    pub fn empty(user: Address, market_id: MarketId) -> Self {
        Self {
            user,
            market_id,
            supply_shares: U256::ZERO,
            borrow_shares: U256::ZERO,
            collateral: U256::ZERO,
        }
    }

    /// Returns the debt of this position in loan assets, rounded up
    pub fn borrow_assets(&self, market: &Market) -> U256 {
        market.to_borrow_assets(self.borrow_shares, RoundingDirection::Up)
    }

    /// Returns whether the position is healthy, or `None` if the price is unknown
    pub fn is_healthy(&self, market: &Market) -> Option<bool> {
        market.is_healthy(self.collateral, self.borrow_shares)
    }

    /// Supply collateral to the position
    pub fn supply_collateral(&self, assets: U256) -> Position {
        let mut new_position = self.clone();
        new_position.collateral = new_position.collateral.saturating_add(assets);
        new_position
    }

    /// Borrow assets against the position's collateral.
    ///
    /// The health check runs only when the market has an oracle price; without
    /// one the borrow is limited by liquidity alone.
    ///
    /// Returns `(new_position, new_market, shares_minted)`.
    pub fn borrow(
        &self,
        market: &Market,
        assets: U256,
    ) -> Result<(Position, Market, U256), SimError> {
        let (new_market, shares) = market.borrow(assets)?;

        let mut new_position = self.clone();
        new_position.borrow_shares += shares;

        if let Some(false) = new_position.is_healthy(&new_market) {
            return Err(SimError::InsufficientCollateral {
                user: self.user,
                market_id: self.market_id,
            });
        }

        Ok((new_position, new_market, shares))
    }
}
