//! Market state and operations for Morpho Blue markets.
//!
//! This module implements the core [`Market`] struct: its accounting state, the
//! derived liquidity / utilization / borrow APY figures, and the share-based
//! supply, withdraw and borrow transitions used by the simulation engine.
//!
//! # Overview
//!
//! A Morpho Blue market is a lending pool with:
//! - **Supply side**: Lenders (mostly vaults) deposit loan assets
//! - **Borrow side**: Borrowers post collateral and draw loan assets
//! - **Share-based accounting**: Positions are tracked via shares, not raw assets
//! - **Adaptive interest rates**: Rates follow utilization through the Adaptive Curve IRM
//!
//! # Rounding
//!
//! Conversions follow the protocol: shares minted to a supplier round down,
//! shares burned from a withdrawing supplier round up, and borrow shares minted
//! to a borrower round up.
//!
//! # Interest
//!
//! Transitions apply to the market as stored. Interest is brought forward once,
//! with [`Market::accrue_interest`], when a snapshot is built.
//!
//! # Example
//!
//! ```rust
//! use morpho_liquidity_sim::{Market, WAD};
//! use alloy_primitives::{FixedBytes, U256};
//!
//! let market = Market::new(
//!     FixedBytes::ZERO,
//!     U256::from(1_000_000) * WAD,  // 1M supply
//!     U256::from(800_000) * WAD,    // 800K borrow (80% utilization)
//!     U256::from(1_000_000) * WAD,
//!     U256::from(800_000) * WAD,
//!     1000,
//!     U256::from(100_000_000_000_000_000u64), // 10% fee
//!     Some(U256::from(1_268_391_679u64)),
//! );
//!
//! assert_eq!(market.liquidity(), U256::from(200_000) * WAD);
//!
//! let (after, _shares) = market.borrow(U256::from(100_000) * WAD).unwrap();
//! assert!(after.utilization() > market.utilization());
//! assert!(after.borrow_apy() >= market.borrow_apy());
//! ```

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{MarketId, SimError};
use crate::irm::{borrow_rate_at, get_borrow_rate};
use crate::math::{
    assets_to_shares, min, mul_div_down, rate_to_apy_wad, shares_to_assets, w_div_down,
    w_div_up, w_mul_down, w_taylor_compounded, zero_floor_sub, RoundingDirection, WAD,
};

/// Oracle price scale (1e36)
pub const ORACLE_PRICE_SCALE: U256 = U256::from_limbs([
    0xC097CE7BC90715B3,
    0x4B9F,
    0,
    0,
]); // 10^36

/// Immutable parameters identifying a Morpho Blue market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Token lent and borrowed in the market
    pub loan_token: Address,
    /// Token posted as collateral
    pub collateral_token: Address,
    /// Oracle pricing collateral in loan token units
    pub oracle: Address,
    /// Interest rate model contract
    pub irm: Address,
    /// Liquidation LTV (WAD-scaled)
    pub lltv: U256,
}

/// Represents a lending market on Morpho Blue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Unique market identifier
    pub id: MarketId,

    /// Market parameters. `None` for snapshots that only carry accounting data.
    pub params: Option<MarketParams>,

    /// Total assets supplied to the market
    pub total_supply_assets: U256,

    /// Total assets borrowed from the market
    pub total_borrow_assets: U256,

    /// Total supply shares
    pub total_supply_shares: U256,

    /// Total borrow shares
    pub total_borrow_shares: U256,

    /// Timestamp of last interest accrual
    pub last_update: u64,

    /// Protocol fee (WAD-scaled)
    pub fee: U256,

    /// Rate at target utilization for the Adaptive Curve IRM (per-second, WAD-scaled).
    /// `None` for markets using other IRMs.
    pub rate_at_target: Option<U256>,

    /// Oracle price of collateral in loan token (scaled by ORACLE_PRICE_SCALE)
    pub price: Option<U256>,
}

impl Market {
    /// Creates a new market without parameters or oracle price.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique 32-byte market identifier
    /// * `total_supply_assets` / `total_borrow_assets` - Asset totals
    /// * `total_supply_shares` / `total_borrow_shares` - Share totals
    /// * `last_update` - Unix timestamp when interest was last accrued
    /// * `fee` - Protocol fee percentage (WAD-scaled)
    /// * `rate_at_target` - Adaptive Curve IRM rate at target, or `None` (0% APY)
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        id: MarketId,
        total_supply_assets: U256,
        total_borrow_assets: U256,
        total_supply_shares: U256,
        total_borrow_shares: U256,
        last_update: u64,
        fee: U256,
        rate_at_target: Option<U256>,
    ) -> Self {
        Self {
            id,
            params: None,
            total_supply_assets,
            total_borrow_assets,
            total_supply_shares,
            total_borrow_shares,
            last_update,
            fee,
            rate_at_target,
            price: None,
        }
    }

    /// Attach market parameters
    pub fn with_params(mut self, params: MarketParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Attach an oracle price
    pub fn with_price(mut self, price: U256) -> Self {
        self.price = Some(price);
        self
    }

    /// Returns the market parameters, or an error if they are unknown
    pub fn require_params(&self) -> Result<&MarketParams, SimError> {
        self.params
            .as_ref()
            .ok_or(SimError::MissingMarketParams { market_id: self.id })
    }

    /// Liquidation LTV, zero when parameters are unknown
    pub fn lltv(&self) -> U256 {
        self.params.map_or(U256::ZERO, |params| params.lltv)
    }

    /// Returns the market's current liquidity (supply - borrow)
    pub fn liquidity(&self) -> U256 {
        zero_floor_sub(self.total_supply_assets, self.total_borrow_assets)
    }

    /// Returns the market's utilization rate (WAD-scaled, within `[0, WAD]`)
    ///
    /// Utilization = totalBorrowAssets / totalSupplyAssets
    pub fn utilization(&self) -> U256 {
        get_utilization(self.total_supply_assets, self.total_borrow_assets)
    }

    /// Instantaneous per-second borrow rate at the current utilization
    pub fn borrow_rate(&self) -> U256 {
        borrow_rate_at(self.utilization(), self.rate_at_target)
    }

    /// Borrow APY compounded over a year (WAD-scaled)
    pub fn borrow_apy(&self) -> U256 {
        rate_to_apy_wad(self.borrow_rate())
    }

    /// Accrues interest on the market up to the given timestamp.
    ///
    /// Interest is computed from the IRM's average rate over the elapsed period
    /// and added to both supply and borrow totals. Protocol fees are minted as
    /// supply shares and `rate_at_target` adapts to the utilization error.
    ///
    /// # Errors
    ///
    /// - [`SimError::InvalidInterestAccrual`] if `timestamp < last_update`
    pub fn accrue_interest(&self, timestamp: u64) -> Result<Market, SimError> {
        if timestamp < self.last_update {
            return Err(SimError::InvalidInterestAccrual {
                timestamp,
                last_update: self.last_update,
            });
        }

        let elapsed = timestamp - self.last_update;
        if elapsed == 0 {
            return Ok(self.clone());
        }

        let (avg_borrow_rate, end_rate_at_target) = match self.rate_at_target {
            None => (U256::ZERO, None),
            Some(rate_at_target) => {
                let result = get_borrow_rate(self.utilization(), rate_at_target, elapsed);
                (result.avg_borrow_rate, Some(result.end_rate_at_target))
            }
        };

        let interest = w_mul_down(
            self.total_borrow_assets,
            w_taylor_compounded(avg_borrow_rate, U256::from(elapsed)),
        );
        let fee_amount = w_mul_down(interest, self.fee);

        // Fee shares are priced against the supply after interest, before the fee
        let fee_shares = assets_to_shares(
            fee_amount,
            self.total_supply_assets + interest - fee_amount,
            self.total_supply_shares,
            RoundingDirection::Down,
        );

        Ok(Market {
            total_supply_assets: self.total_supply_assets + interest,
            total_borrow_assets: self.total_borrow_assets + interest,
            total_supply_shares: self.total_supply_shares + fee_shares,
            last_update: timestamp,
            rate_at_target: end_rate_at_target.or(self.rate_at_target),
            ..self.clone()
        })
    }

    /// Supplies assets to the market as a lender.
    ///
    /// Shares are minted rounding down:
    /// ```text
    /// shares = assets * (total_shares + VIRTUAL_SHARES) / (total_assets + VIRTUAL_ASSETS)
    /// ```
    ///
    /// Returns `(new_market, shares_minted)`. The original market is unchanged.
    pub fn supply(&self, assets: U256) -> Result<(Market, U256), SimError> {
        let mut market = self.clone();

        let shares = market.to_supply_shares(assets, RoundingDirection::Down);

        market.total_supply_assets += assets;
        market.total_supply_shares += shares;

        Ok((market, shares))
    }

    /// Withdraw assets from the market, burning shares rounded up.
    ///
    /// # Errors
    ///
    /// - [`SimError::InsufficientMarketLiquidity`] if `assets > liquidity()`
    pub fn withdraw(&self, assets: U256) -> Result<(Market, U256), SimError> {
        let mut market = self.clone();

        if assets > market.liquidity() {
            return Err(SimError::InsufficientMarketLiquidity { market_id: self.id });
        }

        let shares = market.to_supply_shares(assets, RoundingDirection::Up);

        market.total_supply_assets -= assets;
        market.total_supply_shares = zero_floor_sub(market.total_supply_shares, shares);

        Ok((market, shares))
    }

    /// Borrows assets from the market, minting borrow shares rounded up.
    ///
    /// This only updates market state. Collateral checks live in
    /// [`crate::position::Position::borrow`].
    ///
    /// # Errors
    ///
    /// - [`SimError::InsufficientMarketLiquidity`] if `assets > liquidity()`
    pub fn borrow(&self, assets: U256) -> Result<(Market, U256), SimError> {
        let mut market = self.clone();

        if assets > market.liquidity() {
            return Err(SimError::InsufficientMarketLiquidity { market_id: self.id });
        }

        let shares = market.to_borrow_shares(assets, RoundingDirection::Up);

        market.total_borrow_assets += assets;
        market.total_borrow_shares += shares;

        Ok((market, shares))
    }

    /// Convert assets to supply shares
    pub fn to_supply_shares(&self, assets: U256, rounding: RoundingDirection) -> U256 {
        assets_to_shares(
            assets,
            self.total_supply_assets,
            self.total_supply_shares,
            rounding,
        )
    }

    /// Convert borrow shares to assets
    pub fn to_borrow_assets(&self, shares: U256, rounding: RoundingDirection) -> U256 {
        shares_to_assets(
            shares,
            self.total_borrow_assets,
            self.total_borrow_shares,
            rounding,
        )
    }

    /// Convert assets to borrow shares
    pub fn to_borrow_shares(&self, assets: U256, rounding: RoundingDirection) -> U256 {
        assets_to_shares(
            assets,
            self.total_borrow_assets,
            self.total_borrow_shares,
            rounding,
        )
    }

    /// Checks `shares` minted for `assets` against the shares this market
    /// quotes for them, widened by `slippage` (WAD-scaled).
    ///
    /// A borrow applied to the quoting market always passes; the bound trips
    /// only when the shares were minted against a repriced market.
    ///
    /// # Errors
    ///
    /// - [`SimError::SlippageExceeded`] if `shares` exceeds the bound
    pub fn check_borrow_slippage(
        &self,
        assets: U256,
        shares: U256,
        slippage: U256,
    ) -> Result<(), SimError> {
        let quoted = self.to_borrow_shares(assets, RoundingDirection::Up);
        let max_shares = mul_div_down(quoted, WAD + slippage, WAD);
        if shares > max_shares {
            return Err(SimError::SlippageExceeded {
                market_id: self.id,
                shares,
                max_shares,
            });
        }
        Ok(())
    }

    // ==================== Utilization Targeting ====================

    /// Returns the largest amount that can be withdrawn while keeping utilization
    /// at or below `target_utilization`, bounded by the market's liquidity.
    pub fn get_withdraw_to_utilization(&self, target_utilization: U256) -> U256 {
        min(
            get_withdraw_to_utilization(
                self.total_supply_assets,
                self.total_borrow_assets,
                target_utilization,
            ),
            self.liquidity(),
        )
    }

    // ==================== Collateral ====================

    /// Returns the value of collateral in loan assets
    pub fn get_collateral_value(&self, collateral: U256) -> Option<U256> {
        self.price
            .map(|price| mul_div_down(collateral, price, ORACLE_PRICE_SCALE))
    }

    /// Returns the maximum debt allowed given a certain amount of collateral
    pub fn get_max_borrow_assets(&self, collateral: U256) -> Option<U256> {
        self.get_collateral_value(collateral)
            .map(|value| w_mul_down(value, self.lltv()))
    }

    /// Check if a position is healthy. `None` when the oracle price is unknown.
    pub fn is_healthy(&self, collateral: U256, borrow_shares: U256) -> Option<bool> {
        let max_borrow = self.get_max_borrow_assets(collateral)?;
        let current_borrow = self.to_borrow_assets(borrow_shares, RoundingDirection::Up);
        Some(max_borrow >= current_borrow)
    }
}

// ==================== Utility Functions ====================

/// Calculate the utilization rate (WAD-scaled), clamped to `[0, WAD]`.
///
/// A market without supply has zero utilization.
pub fn get_utilization(total_supply_assets: U256, total_borrow_assets: U256) -> U256 {
    if total_supply_assets.is_zero() {
        return U256::ZERO;
    }
    min(w_div_down(total_borrow_assets, total_supply_assets), WAD)
}

/// Returns the amount to withdraw until the market reaches the target utilization.
///
/// With a zero target, everything can be withdrawn from a market without borrows
/// and nothing otherwise.
pub fn get_withdraw_to_utilization(
    total_supply_assets: U256,
    total_borrow_assets: U256,
    target_utilization: U256,
) -> U256 {
    if target_utilization.is_zero() {
        if total_borrow_assets.is_zero() {
            return total_supply_assets;
        }
        return U256::ZERO;
    }

    zero_floor_sub(
        total_supply_assets,
        w_div_up(total_borrow_assets, target_utilization),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irm::INITIAL_RATE_AT_TARGET;
    use alloy_primitives::FixedBytes;

    fn create_test_market() -> Market {
        Market::new(
            FixedBytes::ZERO,
            U256::from(1_000_000) * WAD,
            U256::from(800_000) * WAD,
            U256::from(1_000_000) * WAD,
            U256::from(800_000) * WAD,
            1000,
            U256::from(100_000_000_000_000_000u64),
            Some(INITIAL_RATE_AT_TARGET),
        )
    }

    fn small_market(supply: u64, borrow: u64) -> Market {
        Market::new(
            FixedBytes::ZERO,
            U256::from(supply),
            U256::from(borrow),
            U256::from(supply) * U256::from(1_000_000),
            U256::from(borrow) * U256::from(1_000_000),
            1000,
            U256::ZERO,
            Some(INITIAL_RATE_AT_TARGET),
        )
    }

    #[test]
    fn test_liquidity_and_utilization() {
        let market = create_test_market();
        assert_eq!(market.liquidity(), U256::from(200_000) * WAD);
        assert_eq!(market.utilization(), U256::from(800_000_000_000_000_000u64));
    }

    #[test]
    fn test_empty_market_is_total() {
        let market = small_market(0, 0);
        assert_eq!(market.liquidity(), U256::ZERO);
        assert_eq!(market.utilization(), U256::ZERO);
        // The curve floor still charges a quarter of the rate at target
        assert!(market.borrow_apy() > U256::ZERO);
    }

    #[test]
    fn test_utilization_is_clamped() {
        // Inconsistent snapshots never report more than 100%
        assert_eq!(get_utilization(U256::from(100), U256::from(200)), WAD);
        assert_eq!(get_utilization(U256::ZERO, U256::from(200)), U256::ZERO);
    }

    #[test]
    fn test_borrow_apy_without_irm_is_zero() {
        let mut market = create_test_market();
        market.rate_at_target = None;
        assert_eq!(market.borrow_apy(), U256::ZERO);
    }

    #[test]
    fn test_borrow_apy_increases_with_utilization() {
        let low = small_market(1000, 100);
        let high = small_market(1000, 950);
        assert!(high.borrow_apy() > low.borrow_apy());
    }

    #[test]
    fn test_supply_rounds_shares_down() {
        let market = Market::new(
            FixedBytes::ZERO,
            U256::from(1_000),
            U256::ZERO,
            U256::from(2_000_000_000u64),
            U256::ZERO,
            1000,
            U256::ZERO,
            None,
        );

        // 1 * (2e9 + 1e6) / (1000 + 1) = 1999000.999
        let (after, shares) = market.supply(U256::from(1)).unwrap();
        assert_eq!(shares, U256::from(1_999_000));
        assert_eq!(after.total_supply_assets, U256::from(1_001));
    }

    #[test]
    fn test_withdraw_rounds_shares_up() {
        let market = Market::new(
            FixedBytes::ZERO,
            U256::from(1_000),
            U256::ZERO,
            U256::from(2_000_000_000u64),
            U256::ZERO,
            1000,
            U256::ZERO,
            None,
        );

        let (after, shares) = market.withdraw(U256::from(1)).unwrap();
        assert_eq!(shares, U256::from(1_999_001));
        assert_eq!(after.total_supply_assets, U256::from(999));
    }

    #[test]
    fn test_borrow_rounds_shares_up() {
        let market = Market::new(
            FixedBytes::ZERO,
            U256::from(1_000),
            U256::from(500),
            U256::from(1_000_000_000u64),
            U256::from(1_000_000_000u64),
            1000,
            U256::ZERO,
            None,
        );

        // 1 * (1e9 + 1e6) / (500 + 1) = 1998003.99
        let (after, shares) = market.borrow(U256::from(1)).unwrap();
        assert_eq!(shares, U256::from(1_998_004));
        assert_eq!(after.total_borrow_assets, U256::from(501));
        assert_eq!(
            market.to_borrow_shares(U256::from(1), RoundingDirection::Down),
            U256::from(1_998_003)
        );
    }

    #[test]
    fn test_borrow_exceeding_liquidity_fails() {
        let market = small_market(1000, 500);
        let result = market.borrow(U256::from(501));
        assert!(matches!(
            result,
            Err(SimError::InsufficientMarketLiquidity { .. })
        ));

        // Borrowing the full liquidity is allowed and reaches 100%
        let (after, _) = market.borrow(U256::from(500)).unwrap();
        assert_eq!(after.utilization(), WAD);
        assert_eq!(after.liquidity(), U256::ZERO);
    }

    #[test]
    fn test_withdraw_exceeding_liquidity_fails() {
        let market = small_market(1000, 900);
        let result = market.withdraw(U256::from(101));
        assert!(matches!(
            result,
            Err(SimError::InsufficientMarketLiquidity { .. })
        ));
    }

    #[test]
    fn test_operations_do_not_mutate_input() {
        let market = create_test_market();
        let snapshot = market.clone();
        let _ = market.borrow(U256::from(1_000) * WAD).unwrap();
        let _ = market.supply(U256::from(1_000) * WAD).unwrap();
        assert_eq!(market, snapshot);
    }

    #[test]
    fn test_zero_borrow_is_noop_on_totals() {
        let market = create_test_market();
        let (after, shares) = market.borrow(U256::ZERO).unwrap();
        assert_eq!(shares, U256::ZERO);
        assert_eq!(after.utilization(), market.utilization());
        assert_eq!(after.liquidity(), market.liquidity());
    }

    // ==================== Accrual ====================

    #[test]
    fn test_accrue_interest() {
        let market = create_test_market();
        let accrued = market.accrue_interest(1000 + 86400).unwrap();

        assert!(accrued.total_supply_assets > market.total_supply_assets);
        assert_eq!(
            accrued.total_supply_assets - market.total_supply_assets,
            accrued.total_borrow_assets - market.total_borrow_assets
        );
        assert!(accrued.total_supply_shares > market.total_supply_shares);
        assert_eq!(accrued.last_update, 1000 + 86400);
    }

    #[test]
    fn test_accrue_interest_same_timestamp_is_identity() {
        let market = create_test_market();
        assert_eq!(market.accrue_interest(1000).unwrap(), market);
    }

    #[test]
    fn test_accrue_interest_in_the_past_fails() {
        let market = create_test_market();
        let result = market.accrue_interest(999);
        assert!(matches!(
            result,
            Err(SimError::InvalidInterestAccrual { timestamp: 999, last_update: 1000 })
        ));
    }

    // ==================== Utilization Targeting ====================

    #[test]
    fn test_withdraw_to_utilization() {
        // 2000 supplied, 200 borrowed, 80% cap: 2000 - 200 / 0.8 = 1750
        let cap = U256::from(800_000_000_000_000_000u64);
        assert_eq!(
            get_withdraw_to_utilization(U256::from(2000), U256::from(200), cap),
            U256::from(1750)
        );

        // Already above the cap
        assert_eq!(
            get_withdraw_to_utilization(U256::from(1000), U256::from(900), cap),
            U256::ZERO
        );
    }

    #[test]
    fn test_withdraw_to_utilization_zero_target() {
        assert_eq!(
            get_withdraw_to_utilization(U256::from(1000), U256::ZERO, U256::ZERO),
            U256::from(1000)
        );
        assert_eq!(
            get_withdraw_to_utilization(U256::from(1000), U256::from(1), U256::ZERO),
            U256::ZERO
        );
    }

    #[test]
    fn test_withdraw_to_utilization_bounded_by_liquidity() {
        // A 100% cap would allow withdrawing down to the borrowed amount, which is the liquidity
        let market = small_market(1000, 400);
        assert_eq!(market.get_withdraw_to_utilization(WAD), U256::from(600));
    }

    // ==================== Collateral ====================

    #[test]
    fn test_health_with_large_collateral() {
        let params = MarketParams {
            loan_token: Address::repeat_byte(1),
            collateral_token: Address::repeat_byte(2),
            oracle: Address::repeat_byte(3),
            irm: Address::repeat_byte(4),
            lltv: U256::from(860_000_000_000_000_000u64),
        };
        let market = create_test_market()
            .with_params(params)
            .with_price(ORACLE_PRICE_SCALE * U256::from(3_000));

        // Collateral seeded at MAX / 2 must not overflow the health check
        let collateral = U256::MAX / U256::from(2);
        assert_eq!(market.is_healthy(collateral, U256::from(1_000) * WAD), Some(true));
        assert_eq!(market.is_healthy(U256::ZERO, U256::from(1_000) * WAD), Some(false));
    }

    #[test]
    fn test_health_unknown_price() {
        let market = create_test_market();
        assert_eq!(market.is_healthy(U256::from(1), U256::from(1)), None);
        assert!(matches!(
            market.require_params(),
            Err(SimError::MissingMarketParams { .. })
        ));
    }
}
