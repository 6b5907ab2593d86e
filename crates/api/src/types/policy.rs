//! Public allocator policy derived from the API's per-market targets.

use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use morpho_liquidity_sim::PublicAllocatorOptions;

use super::scalars::{parse_address, parse_market_id};
use crate::queries::targets::get_market_targets::ResponseData;

/// Utilization targets and whitelisted vaults of one chain.
///
/// Entries with an unparsable id or target are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketTargets {
    /// Per-market supply target, from `targetBorrowUtilization` (advisory).
    pub supply_target_utilization: HashMap<B256, U256>,
    /// Per-market withdrawal cap, from `targetWithdrawUtilization`.
    pub max_withdrawal_utilization: HashMap<B256, U256>,
    /// Whitelisted vaults, in API order.
    pub reallocatable_vaults: Vec<Address>,
}

impl MarketTargets {
    /// Convert a `GetMarketTargets` response.
    pub fn from_gql(data: ResponseData) -> Self {
        let mut targets = Self::default();

        for item in data.markets.items.unwrap_or_default() {
            let Some(market_id) = parse_market_id(&item.unique_key) else {
                continue;
            };
            if let Some(target) = item.target_borrow_utilization {
                targets.supply_target_utilization.insert(market_id, target);
            }
            if let Some(cap) = item.target_withdraw_utilization {
                targets.max_withdrawal_utilization.insert(market_id, cap);
            }
        }

        for vault in data.vaults.items.unwrap_or_default() {
            if let Some(address) = parse_address(&vault.address) {
                if !targets.reallocatable_vaults.contains(&address) {
                    targets.reallocatable_vaults.push(address);
                }
            }
        }

        targets
    }

    /// Allocator options with these targets over the engine defaults.
    pub fn to_allocator_options(&self) -> PublicAllocatorOptions {
        PublicAllocatorOptions {
            supply_target_utilization: self.supply_target_utilization.clone(),
            max_withdrawal_utilization: self.max_withdrawal_utilization.clone(),
            reallocatable_vaults: self.reallocatable_vaults.clone(),
            ..PublicAllocatorOptions::default()
        }
    }
}
