//! Token balances and Morpho allowances of simulated principals.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// A principal's balance of one token and its allowance toward Morpho.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Owner of the tokens
    pub user: Address,
    /// ERC-20 token address
    pub token: Address,
    /// Current balance
    pub balance: U256,
    /// Amount Morpho may pull from `user`. `U256::MAX` never decreases.
    pub morpho_allowance: U256,
}

impl Holding {
    /// A zero balance with no allowance.
    pub fn empty(user: Address, token: Address) -> Self {
        Self {
            user,
            token,
            balance: U256::ZERO,
            morpho_allowance: U256::ZERO,
        }
    }

    /// A holding with `balance` tokens and an unlimited Morpho allowance.
    pub fn approved(user: Address, token: Address, balance: U256) -> Self {
        Self {
            user,
            token,
            balance,
            morpho_allowance: U256::MAX,
        }
    }

    /// Moves `amount` from this holding into Morpho.
    ///
    /// # Errors
    ///
    /// - [`SimError::InsufficientAllowance`] if Morpho is not approved for `amount`
    /// - [`SimError::InsufficientBalance`] if the balance is below `amount`
    pub fn transfer_to_morpho(&self, amount: U256) -> Result<Holding, SimError> {
        if self.morpho_allowance < amount {
            return Err(SimError::InsufficientAllowance {
                user: self.user,
                token: self.token,
            });
        }
        if self.balance < amount {
            return Err(SimError::InsufficientBalance {
                user: self.user,
                token: self.token,
            });
        }

        let mut holding = self.clone();
        holding.balance -= amount;
        if holding.morpho_allowance != U256::MAX {
            holding.morpho_allowance -= amount;
        }
        Ok(holding)
    }

    /// Adds `amount` to the balance.
    pub fn credit(&self, amount: U256) -> Holding {
        let mut holding = self.clone();
        holding.balance = holding.balance.saturating_add(amount);
        holding
    }
}
