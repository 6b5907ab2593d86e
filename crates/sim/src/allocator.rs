//! Public allocator reallocation planning.
//!
//! When a target market lacks idle liquidity for a borrow, vaults that supply
//! into it can be asked to move supply from sibling markets through the public
//! allocator. [`plan_reallocation`] decides which `(vault, source market)` pairs
//! to drain and by how much.
//!
//! # Algorithm
//!
//! Candidates are visited greedily in caller order: vaults in
//! [`PublicAllocatorOptions::reallocatable_vaults`] order, then each vault's
//! withdraw queue. For each candidate the available amount is the minimum of
//!
//! - the vault's reallocatable liquidity in the source (supply, `max_out`, market liquidity),
//! - the amount withdrawable before the source crosses its max withdrawal utilization,
//! - the vault's remaining inflow room in the target (`max_in`, supply cap).
//!
//! Withdrawals are planned against locally adjusted copies of the source
//! markets, so two vaults draining the same source never over-count its
//! liquidity. A plan that exhausts every candidate reports the rest of the need
//! as a shortfall; it is a valid outcome, not an error.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{MarketId, SimError};
use crate::market::Market;
use crate::math::{min, WAD};
use crate::state::SimulationState;

/// Utilization above which the shared liquidity algorithm is triggered (90.5%).
///
/// Reported to callers as policy context; the planner never enforces it.
pub const DEFAULT_SUPPLY_TARGET_UTILIZATION: U256 =
    U256::from_limbs([905_000_000_000_000_000, 0, 0, 0]);

/// Withdrawal utilization cap applied to markets without a configured one.
pub const DEFAULT_MAX_WITHDRAWAL_UTILIZATION: U256 = WAD;

/// Reallocation policy for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAllocatorOptions {
    /// Whether reallocation may be planned at all
    pub enabled: bool,
    /// Supply target for markets without a configured one
    pub default_supply_target_utilization: U256,
    /// Per-market supply targets
    pub supply_target_utilization: HashMap<MarketId, U256>,
    /// Withdrawal cap for markets without a configured one
    pub default_max_withdrawal_utilization: U256,
    /// Per-market withdrawal caps
    pub max_withdrawal_utilization: HashMap<MarketId, U256>,
    /// Vaults eligible for reallocation, in visiting order
    pub reallocatable_vaults: Vec<Address>,
}

impl Default for PublicAllocatorOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            default_supply_target_utilization: DEFAULT_SUPPLY_TARGET_UTILIZATION,
            supply_target_utilization: HashMap::new(),
            default_max_withdrawal_utilization: DEFAULT_MAX_WITHDRAWAL_UTILIZATION,
            max_withdrawal_utilization: HashMap::new(),
            reallocatable_vaults: Vec::new(),
        }
    }
}

impl PublicAllocatorOptions {
    /// Options that never plan a reallocation.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Append an eligible vault
    pub fn with_reallocatable_vault(mut self, vault: Address) -> Self {
        self.reallocatable_vaults.push(vault);
        self
    }

    /// Set a market's withdrawal cap
    pub fn with_max_withdrawal_utilization(mut self, market_id: MarketId, cap: U256) -> Self {
        self.max_withdrawal_utilization.insert(market_id, cap);
        self
    }

    /// Set a market's supply target
    pub fn with_supply_target_utilization(mut self, market_id: MarketId, target: U256) -> Self {
        self.supply_target_utilization.insert(market_id, target);
        self
    }

    /// Withdrawal cap applying to `market_id`
    pub fn max_withdrawal_utilization_for(&self, market_id: &MarketId) -> U256 {
        self.max_withdrawal_utilization
            .get(market_id)
            .copied()
            .unwrap_or(self.default_max_withdrawal_utilization)
    }

    /// Supply target applying to `market_id`
    pub fn supply_target_utilization_for(&self, market_id: &MarketId) -> U256 {
        self.supply_target_utilization
            .get(market_id)
            .copied()
            .unwrap_or(self.default_supply_target_utilization)
    }
}

/// One planned withdrawal from a vault's supply in a source market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedWithdrawal {
    pub vault: Address,
    pub market_id: MarketId,
    pub amount: U256,
}

/// Output of [`plan_reallocation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReallocationPlan {
    /// Market receiving the reallocated liquidity
    pub target_market_id: MarketId,
    /// Liquidity requested beyond the target's idle liquidity
    pub need: U256,
    /// Withdrawals in candidate order
    pub withdrawals: Vec<PlannedWithdrawal>,
    /// Sum of planned withdrawals
    pub matched: U256,
    /// Part of `need` left unmatched
    pub shortfall: U256,
}

impl ReallocationPlan {
    fn empty(target_market_id: MarketId, need: U256) -> Self {
        Self {
            target_market_id,
            need,
            withdrawals: Vec::new(),
            matched: U256::ZERO,
            shortfall: need,
        }
    }

    /// Whether the whole need is covered
    pub fn is_fully_matched(&self) -> bool {
        self.shortfall.is_zero()
    }

    /// Whether nothing is withdrawn
    pub fn is_empty(&self) -> bool {
        self.withdrawals.is_empty()
    }
}

/// Plans withdrawals covering `need` additional assets in `target`.
///
/// A zero need, or disabled options, yield an empty plan.
///
/// # Errors
///
/// Returns [`SimError::MarketNotFound`] if `target` is not in `state`.
pub fn plan_reallocation(
    state: &SimulationState,
    target: MarketId,
    need: U256,
    options: &PublicAllocatorOptions,
) -> Result<ReallocationPlan, SimError> {
    state.market(&target)?;

    let mut plan = ReallocationPlan::empty(target, need);
    if need.is_zero() || !options.enabled {
        return Ok(plan);
    }

    let mut sources: HashMap<MarketId, Market> = HashMap::new();
    let mut seen_vaults = HashSet::new();
    let mut remaining = need;

    'vaults: for vault_address in &options.reallocatable_vaults {
        if !seen_vaults.insert(*vault_address) {
            continue;
        }
        let Ok(vault) = state.vault(vault_address) else {
            tracing::debug!(vault = %vault_address, "reallocatable vault not in snapshot");
            continue;
        };

        let mut inflow_left = vault.max_inflow(target);

        for source_id in &vault.withdraw_queue {
            if remaining.is_zero() {
                break 'vaults;
            }
            if inflow_left.is_zero() {
                break;
            }
            if *source_id == target {
                continue;
            }

            let source = match sources.get(source_id) {
                Some(source) => source.clone(),
                None => match state.market(source_id) {
                    Ok(market) => market.clone(),
                    Err(_) => continue,
                },
            };

            let cap = options.max_withdrawal_utilization_for(source_id);
            let available = min(
                min(
                    vault.reallocatable_liquidity(&source),
                    source.get_withdraw_to_utilization(cap),
                ),
                inflow_left,
            );
            let amount = min(available, remaining);
            if amount.is_zero() {
                continue;
            }

            let (drained, _) = source.withdraw(amount)?;
            sources.insert(*source_id, drained);

            inflow_left -= amount;
            remaining -= amount;
            plan.withdrawals.push(PlannedWithdrawal {
                vault: *vault_address,
                market_id: *source_id,
                amount,
            });
        }
    }

    plan.matched = need - remaining;
    plan.shortfall = remaining;

    tracing::debug!(
        target_market = %target,
        need = %plan.need,
        matched = %plan.matched,
        shortfall = %plan.shortfall,
        withdrawals = plan.withdrawals.len(),
        "planned reallocation"
    );

    Ok(plan)
}

/// Total liquidity the public allocator could bring into `target`.
pub fn max_reallocatable(
    state: &SimulationState,
    target: MarketId,
    options: &PublicAllocatorOptions,
) -> Result<U256, SimError> {
    Ok(plan_reallocation(state, target, U256::MAX, options)?.matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{PublicAllocatorMarketConfig, Vault, VaultMarketConfig};
    use alloy_primitives::FixedBytes;

    fn market_id(byte: u8) -> MarketId {
        FixedBytes::repeat_byte(byte)
    }

    fn create_test_market(byte: u8, supply: u64, borrow: u64) -> Market {
        Market::new(
            market_id(byte),
            U256::from(supply),
            U256::from(borrow),
            U256::from(supply) * U256::from(1_000_000),
            U256::from(borrow) * U256::from(1_000_000),
            1000,
            U256::ZERO,
            None,
        )
    }

    fn percent(value: u64) -> U256 {
        U256::from(value) * WAD / U256::from(100)
    }

    fn vault_a() -> Address {
        Address::repeat_byte(0xA1)
    }

    fn vault_b() -> Address {
        Address::repeat_byte(0xB2)
    }

    /// Target 1000/500, source 2000/200 fully supplied by one vault.
    fn create_test_state() -> SimulationState {
        let vault = Vault::new(vault_a())
            .with_allocation(VaultMarketConfig::unbounded(market_id(2), U256::from(2_000)))
            .with_allocation(VaultMarketConfig::unbounded(market_id(1), U256::ZERO));

        SimulationState::new(1000)
            .with_market(create_test_market(1, 1_000, 500))
            .with_market(create_test_market(2, 2_000, 200))
            .with_vault(vault)
    }

    fn options() -> PublicAllocatorOptions {
        PublicAllocatorOptions::default()
            .with_reallocatable_vault(vault_a())
            .with_max_withdrawal_utilization(market_id(2), percent(80))
    }

    #[test]
    fn test_options_defaults() {
        let options = PublicAllocatorOptions::default();
        assert!(options.enabled);
        assert_eq!(options.max_withdrawal_utilization_for(&market_id(1)), WAD);
        assert_eq!(
            options.supply_target_utilization_for(&market_id(1)),
            DEFAULT_SUPPLY_TARGET_UTILIZATION
        );
    }

    #[test]
    fn test_plan_within_cap() {
        let state = create_test_state();
        let plan = plan_reallocation(&state, market_id(1), U256::from(300), &options()).unwrap();

        assert!(plan.is_fully_matched());
        assert_eq!(
            plan.withdrawals,
            vec![PlannedWithdrawal {
                vault: vault_a(),
                market_id: market_id(2),
                amount: U256::from(300),
            }]
        );
    }

    #[test]
    fn test_plan_reports_shortfall_at_cap() {
        // 200 borrowed at an 80% cap keeps at least 250 supplied: 1750 withdrawable
        let state = create_test_state();
        let plan = plan_reallocation(&state, market_id(1), U256::from(2_000), &options()).unwrap();

        assert_eq!(plan.matched, U256::from(1_750));
        assert_eq!(plan.shortfall, U256::from(250));
        assert!(!plan.is_fully_matched());
    }

    #[test]
    fn test_zero_need_is_empty() {
        let state = create_test_state();
        let plan = plan_reallocation(&state, market_id(1), U256::ZERO, &options()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.shortfall, U256::ZERO);
    }

    #[test]
    fn test_disabled_options_plan_nothing() {
        let state = create_test_state();
        let plan = plan_reallocation(
            &state,
            market_id(1),
            U256::from(100),
            &PublicAllocatorOptions::disabled(),
        )
        .unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.shortfall, U256::from(100));
    }

    #[test]
    fn test_source_above_cap_yields_nothing() {
        let state = create_test_state().with_market(create_test_market(2, 2_000, 1_900));
        let plan = plan_reallocation(&state, market_id(1), U256::from(100), &options()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.shortfall, U256::from(100));
    }

    #[test]
    fn test_target_is_never_a_source() {
        let vault = Vault::new(vault_a())
            .with_allocation(VaultMarketConfig::unbounded(market_id(1), U256::from(1_000)));
        let state = SimulationState::new(1000)
            .with_market(create_test_market(1, 1_000, 500))
            .with_vault(vault);

        let plan = plan_reallocation(&state, market_id(1), U256::from(100), &options()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unlisted_vault_is_ignored() {
        let state = create_test_state();
        let plan = plan_reallocation(
            &state,
            market_id(1),
            U256::from(100),
            &PublicAllocatorOptions::default(),
        )
        .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unknown_target_fails() {
        let state = create_test_state();
        let result = plan_reallocation(&state, market_id(9), U256::from(1), &options());
        assert!(matches!(result, Err(SimError::MarketNotFound { .. })));
    }

    #[test]
    fn test_candidate_order_follows_vault_list() {
        // Both vaults can cover the need; the first listed one wins
        let vault_one = Vault::new(vault_a())
            .with_allocation(VaultMarketConfig::unbounded(market_id(2), U256::from(1_000)))
            .with_allocation(VaultMarketConfig::unbounded(market_id(1), U256::ZERO));
        let vault_two = Vault::new(vault_b())
            .with_allocation(VaultMarketConfig::unbounded(market_id(3), U256::from(1_000)))
            .with_allocation(VaultMarketConfig::unbounded(market_id(1), U256::ZERO));

        let state = SimulationState::new(1000)
            .with_market(create_test_market(1, 1_000, 500))
            .with_market(create_test_market(2, 1_000, 0))
            .with_market(create_test_market(3, 1_000, 0))
            .with_vault(vault_one)
            .with_vault(vault_two);

        let options = PublicAllocatorOptions::default()
            .with_reallocatable_vault(vault_b())
            .with_reallocatable_vault(vault_a());

        let plan = plan_reallocation(&state, market_id(1), U256::from(1_200), &options).unwrap();
        assert_eq!(plan.withdrawals.len(), 2);
        assert_eq!(plan.withdrawals[0].vault, vault_b());
        assert_eq!(plan.withdrawals[0].amount, U256::from(1_000));
        assert_eq!(plan.withdrawals[1].vault, vault_a());
        assert_eq!(plan.withdrawals[1].amount, U256::from(200));
    }

    #[test]
    fn test_shared_source_is_not_double_counted() {
        // Two vaults supply the same source, whose liquidity is only 300
        let vault_one = Vault::new(vault_a())
            .with_allocation(VaultMarketConfig::unbounded(market_id(2), U256::from(500)))
            .with_allocation(VaultMarketConfig::unbounded(market_id(1), U256::ZERO));
        let vault_two = Vault::new(vault_b())
            .with_allocation(VaultMarketConfig::unbounded(market_id(2), U256::from(500)))
            .with_allocation(VaultMarketConfig::unbounded(market_id(1), U256::ZERO));

        let state = SimulationState::new(1000)
            .with_market(create_test_market(1, 1_000, 1_000))
            .with_market(create_test_market(2, 1_000, 700))
            .with_vault(vault_one)
            .with_vault(vault_two);

        let options = PublicAllocatorOptions::default()
            .with_reallocatable_vault(vault_a())
            .with_reallocatable_vault(vault_b());

        let plan = plan_reallocation(&state, market_id(1), U256::from(1_000), &options).unwrap();
        assert_eq!(plan.matched, U256::from(300));
        assert_eq!(plan.withdrawals.len(), 1);
        assert_eq!(plan.shortfall, U256::from(700));
    }

    #[test]
    fn test_max_in_limits_vault() {
        let mut target = VaultMarketConfig::unbounded(market_id(1), U256::ZERO);
        target.public_allocator_config = Some(PublicAllocatorMarketConfig {
            max_in: U256::from(120),
            max_out: U256::MAX,
        });
        let vault = Vault::new(vault_a())
            .with_allocation(VaultMarketConfig::unbounded(market_id(2), U256::from(2_000)))
            .with_allocation(target);
        let state = create_test_state().with_vault(vault);

        let plan = plan_reallocation(&state, market_id(1), U256::from(300), &options()).unwrap();
        assert_eq!(plan.matched, U256::from(120));
        assert_eq!(plan.shortfall, U256::from(180));
    }

    #[test]
    fn test_max_reallocatable() {
        let state = create_test_state();
        assert_eq!(
            max_reallocatable(&state, market_id(1), &options()).unwrap(),
            U256::from(1_750)
        );
        assert_eq!(
            max_reallocatable(&state, market_id(1), &PublicAllocatorOptions::disabled()).unwrap(),
            U256::ZERO
        );
    }
}
