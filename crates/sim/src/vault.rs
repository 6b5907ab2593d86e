//! MetaMorpho vault allocations and public allocator bookkeeping.
//!
//! A vault supplies into several Morpho Blue markets. Through the public
//! allocator anyone may move a vault's supply from one market to another,
//! within per-market flow caps (`max_in` / `max_out`) and supply caps. This
//! module tracks those limits and computes how much of a vault's supply is
//! reallocatable toward a given target market.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};

use crate::error::{MarketId, SimError};
use crate::market::Market;
use crate::math::{min, zero_floor_sub};
use crate::operation::Withdrawal;

/// Configuration for a market within a vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultMarketConfig {
    /// The market's unique identifier
    pub market_id: MarketId,
    /// Maximum supply cap for this market
    pub cap: U256,
    /// Current supply to this market from the vault
    pub supply_assets: U256,
    /// Whether this market is enabled
    pub enabled: bool,
    /// Public allocator configuration (if any)
    pub public_allocator_config: Option<PublicAllocatorMarketConfig>,
}

impl VaultMarketConfig {
    /// An enabled allocation whose flow caps are unbounded.
    pub fn unbounded(market_id: MarketId, supply_assets: U256) -> Self {
        Self {
            market_id,
            cap: U256::MAX,
            supply_assets,
            enabled: true,
            public_allocator_config: Some(PublicAllocatorMarketConfig {
                max_in: U256::MAX,
                max_out: U256::MAX,
            }),
        }
    }

    /// Remaining room under the supply cap
    pub fn cap_room(&self) -> U256 {
        zero_floor_sub(self.cap, self.supply_assets)
    }
}

/// Public allocator configuration for a specific market
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAllocatorMarketConfig {
    /// Maximum assets that can flow into this market
    pub max_in: U256,
    /// Maximum assets that can flow out of this market
    pub max_out: U256,
}

/// Vault-level public allocator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicAllocatorConfig {
    /// Fee to use public allocator (in native token)
    pub fee: U256,
    /// Accrued fees
    pub accrued_fee: U256,
}

/// Represents a MetaMorpho vault's allocation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    /// The vault's address
    pub address: Address,
    /// Ordered withdraw queue (markets to withdraw from)
    pub withdraw_queue: Vec<MarketId>,
    /// Market configurations and current allocations
    pub allocations: HashMap<MarketId, VaultMarketConfig>,
    /// Public allocator configuration
    pub public_allocator_config: Option<PublicAllocatorConfig>,
}

impl Vault {
    /// Create a vault with no allocations and a zero-fee public allocator
    pub fn new(address: Address) -> Self {
        Self {
            address,
            withdraw_queue: Vec::new(),
            allocations: HashMap::new(),
            public_allocator_config: Some(PublicAllocatorConfig::default()),
        }
    }

    /// Add (or replace) an allocation. New markets are appended to the withdraw queue.
    pub fn with_allocation(mut self, config: VaultMarketConfig) -> Self {
        if !self.allocations.contains_key(&config.market_id) {
            self.withdraw_queue.push(config.market_id);
        }
        self.allocations.insert(config.market_id, config);
        self
    }

    /// Set the public allocator fee
    pub fn with_public_allocator_fee(mut self, fee: U256) -> Self {
        self.public_allocator_config = Some(PublicAllocatorConfig {
            fee,
            accrued_fee: U256::ZERO,
        });
        self
    }

    /// Assets the public allocator may withdraw from `source` for this vault.
    ///
    /// Bounded by the vault's supply, the market's `max_out` and the source
    /// market's liquidity. Disabled or unconfigured markets yield zero.
    pub fn reallocatable_liquidity(&self, source: &Market) -> U256 {
        if self.public_allocator_config.is_none() {
            return U256::ZERO;
        }

        match self.allocations.get(&source.id) {
            Some(VaultMarketConfig {
                enabled: true,
                supply_assets,
                public_allocator_config: Some(flow),
                ..
            }) => min(min(*supply_assets, flow.max_out), source.liquidity()),
            _ => U256::ZERO,
        }
    }

    /// Assets the public allocator may deposit into `target` for this vault.
    pub fn max_inflow(&self, target: MarketId) -> U256 {
        if self.public_allocator_config.is_none() {
            return U256::ZERO;
        }

        match self.allocations.get(&target) {
            Some(
                config @ VaultMarketConfig {
                    enabled: true,
                    public_allocator_config: Some(flow),
                    ..
                },
            ) => min(flow.max_in, config.cap_room()),
            _ => U256::ZERO,
        }
    }

    /// Validates a public reallocation and updates the vault's side of it.
    ///
    /// Withdrawals must be sorted by market id without duplicates and must not
    /// include `target`. Flow caps move in opposite directions for sources and
    /// target, and the allocator fee accrues. Market totals are left to the caller.
    ///
    /// Returns the updated vault and the total amount moved.
    pub fn public_reallocate(
        &self,
        withdrawals: &[Withdrawal],
        target: MarketId,
    ) -> Result<(Vault, U256), SimError> {
        let allocator = self
            .public_allocator_config
            .as_ref()
            .ok_or(SimError::PublicAllocatorNotConfigured { vault: self.address })?;

        if withdrawals.is_empty() {
            return Err(SimError::EmptyWithdrawals { vault: self.address });
        }

        let mut vault = self.clone();
        let mut total_withdrawn = U256::ZERO;
        let mut prev_id: Option<MarketId> = None;

        for withdrawal in withdrawals {
            if prev_id.is_some_and(|prev| withdrawal.market_id <= prev) {
                return Err(SimError::WithdrawalsNotSorted { vault: self.address });
            }
            prev_id = Some(withdrawal.market_id);

            if withdrawal.market_id == target {
                return Err(SimError::DepositMarketInWithdrawals {
                    vault: self.address,
                    market_id: target,
                });
            }

            let config = vault.enabled_allocation_mut(withdrawal.market_id)?;
            let address = self.address;
            let flow = config
                .public_allocator_config
                .as_mut()
                .ok_or(SimError::PublicAllocatorNotConfigured { vault: address })?;

            if flow.max_out < withdrawal.amount {
                return Err(SimError::MaxOutflowExceeded {
                    vault: address,
                    market_id: withdrawal.market_id,
                });
            }
            if config.supply_assets < withdrawal.amount {
                return Err(SimError::InsufficientMarketLiquidity {
                    market_id: withdrawal.market_id,
                });
            }

            flow.max_out -= withdrawal.amount;
            flow.max_in = flow.max_in.saturating_add(withdrawal.amount);
            config.supply_assets -= withdrawal.amount;
            total_withdrawn += withdrawal.amount;
        }

        let address = self.address;
        let config = vault.enabled_allocation_mut(target)?;
        let flow = config
            .public_allocator_config
            .as_mut()
            .ok_or(SimError::PublicAllocatorNotConfigured { vault: address })?;

        if flow.max_in < total_withdrawn {
            return Err(SimError::MaxInflowExceeded {
                vault: address,
                market_id: target,
            });
        }
        flow.max_in -= total_withdrawn;
        flow.max_out = flow.max_out.saturating_add(total_withdrawn);

        if config.cap_room() < total_withdrawn {
            return Err(SimError::SupplyCapExceeded {
                vault: address,
                market_id: target,
                cap: config.cap,
            });
        }
        config.supply_assets += total_withdrawn;

        vault.public_allocator_config = Some(PublicAllocatorConfig {
            fee: allocator.fee,
            accrued_fee: allocator.accrued_fee.saturating_add(allocator.fee),
        });

        Ok((vault, total_withdrawn))
    }

    fn enabled_allocation_mut(
        &mut self,
        market_id: MarketId,
    ) -> Result<&mut VaultMarketConfig, SimError> {
        let address = self.address;
        let config = self
            .allocations
            .get_mut(&market_id)
            .ok_or(SimError::MarketNotFound { market_id })?;

        if !config.enabled {
            return Err(SimError::MarketNotEnabled {
                vault: address,
                market_id,
            });
        }
        Ok(config)
    }
}
