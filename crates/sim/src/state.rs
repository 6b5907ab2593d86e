//! Immutable simulation state.
//!
//! A [`SimulationState`] is a snapshot of every market, vault, position and
//! holding a simulation touches. Applying an [`Operation`] never mutates the
//! snapshot it is applied to: [`SimulationState::with_operation`] returns a new
//! snapshot and leaves the input valid, so before/after comparisons read two
//! independent values.
//!
//! Entries are stored behind [`Arc`] and copied on write with
//! [`Arc::make_mut`], so successive snapshots share every entry an operation
//! did not touch.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};

use crate::error::{MarketId, SimError};
use crate::holding::Holding;
use crate::market::Market;
use crate::operation::Operation;
use crate::position::Position;
use crate::vault::Vault;

type PositionsByMarket = HashMap<MarketId, Position>;
type HoldingsByToken = HashMap<Address, Holding>;

/// Snapshot of markets, vaults, positions and holdings at one point in time.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    /// Timestamp the snapshot was taken at. Operations act on the stored
    /// markets as they are and never accrue interest up to it.
    pub timestamp: u64,
    markets: HashMap<MarketId, Arc<Market>>,
    vaults: HashMap<Address, Arc<Vault>>,
    positions: HashMap<Address, Arc<PositionsByMarket>>,
    holdings: HashMap<Address, Arc<HoldingsByToken>>,
}

impl SimulationState {
    /// Create an empty state at `timestamp`.
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    // ==================== Construction ====================

    /// Add or replace a market
    pub fn with_market(mut self, market: Market) -> Self {
        self.markets.insert(market.id, Arc::new(market));
        self
    }

    /// Add or replace a vault
    pub fn with_vault(mut self, vault: Vault) -> Self {
        self.vaults.insert(vault.address, Arc::new(vault));
        self
    }

    /// Add or replace a position, creating the principal's entry if needed
    pub fn with_position(mut self, position: Position) -> Self {
        self.put_position(position);
        self
    }

    /// Add or replace a holding, creating the principal's entry if needed
    pub fn with_holding(mut self, holding: Holding) -> Self {
        self.put_holding(holding);
        self
    }

    // ==================== Accessors ====================

    /// Look up a market
    pub fn market(&self, market_id: &MarketId) -> Result<&Market, SimError> {
        self.markets
            .get(market_id)
            .map(AsRef::as_ref)
            .ok_or(SimError::MarketNotFound {
                market_id: *market_id,
            })
    }

    /// Look up a vault
    pub fn vault(&self, address: &Address) -> Result<&Vault, SimError> {
        self.vaults
            .get(address)
            .map(AsRef::as_ref)
            .ok_or(SimError::VaultNotFound { vault: *address })
    }

    /// All markets, in no particular order
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values().map(AsRef::as_ref)
    }

    /// All vaults, in no particular order
    pub fn vaults(&self) -> impl Iterator<Item = &Vault> {
        self.vaults.values().map(AsRef::as_ref)
    }

    /// A principal's position, or an empty one if none exists
    pub fn position(&self, user: Address, market_id: MarketId) -> Position {
        self.positions
            .get(&user)
            .and_then(|positions| positions.get(&market_id))
            .cloned()
            .unwrap_or_else(|| Position::empty(user, market_id))
    }

    /// A principal's holding, or an empty one if none exists
    pub fn holding(&self, user: Address, token: Address) -> Holding {
        self.holdings
            .get(&user)
            .and_then(|holdings| holdings.get(&token))
            .cloned()
            .unwrap_or_else(|| Holding::empty(user, token))
    }

    // ==================== Transitions ====================

    /// Apply one operation, returning the successor state.
    ///
    /// `self` is never modified.
    pub fn with_operation(&self, operation: &Operation) -> Result<SimulationState, SimError> {
        let mut next = self.clone();

        match operation {
            Operation::SupplyCollateral {
                market_id,
                assets,
                on_behalf,
            } => {
                let market = self.market(market_id)?;
                let params = market.require_params()?;

                let holding = self
                    .holding(*on_behalf, params.collateral_token)
                    .transfer_to_morpho(*assets)?;
                let position = self
                    .position(*on_behalf, *market_id)
                    .supply_collateral(*assets);

                next.put_holding(holding);
                next.put_position(position);
            }
            Operation::Borrow {
                market_id,
                assets,
                on_behalf,
                receiver,
                slippage,
            } => {
                let market = self.market(market_id)?;
                let params = market.require_params()?;

                let (position, borrowed, shares) = self
                    .position(*on_behalf, *market_id)
                    .borrow(market, *assets)?;
                market.check_borrow_slippage(*assets, shares, *slippage)?;

                let holding = next.holding(*receiver, params.loan_token).credit(*assets);

                next.put_market(borrowed);
                next.put_position(position);
                next.put_holding(holding);
            }
            Operation::PublicReallocate {
                vault,
                target_market_id,
                withdrawals,
            } => {
                let (vault, total) = self
                    .vault(vault)?
                    .public_reallocate(withdrawals, *target_market_id)?;

                for withdrawal in withdrawals {
                    let (market, _) = next
                        .market(&withdrawal.market_id)?
                        .withdraw(withdrawal.amount)?;
                    next.put_market(market);
                }

                let (target, _) = next.market(target_market_id)?.supply(total)?;
                next.put_market(target);
                next.put_vault(vault);
            }
        }

        Ok(next)
    }

    fn put_market(&mut self, market: Market) {
        match self.markets.get_mut(&market.id) {
            Some(entry) => *Arc::make_mut(entry) = market,
            None => {
                self.markets.insert(market.id, Arc::new(market));
            }
        }
    }

    fn put_vault(&mut self, vault: Vault) {
        self.vaults.insert(vault.address, Arc::new(vault));
    }

    fn put_position(&mut self, position: Position) {
        let positions = self.positions.entry(position.user).or_default();
        Arc::make_mut(positions).insert(position.market_id, position);
    }

    fn put_holding(&mut self, holding: Holding) {
        let holdings = self.holdings.entry(holding.user).or_default();
        Arc::make_mut(holdings).insert(holding.token, holding);
    }
}
