//! Adaptive Curve Interest Rate Model (IRM) implementation.
//!
//! This module implements the [Adaptive Curve IRM](https://docs.morpho.org/morpho/concepts/adaptive-interest-rate-model)
//! used by Morpho Blue, which dynamically adjusts interest rates based on market utilization.
//!
//! The simulation engine reads rates through [`borrow_rate_at`], which evaluates the
//! curve at a snapshot without elapsed time. [`get_borrow_rate`] with a non-zero
//! `elapsed` is only used when accruing a freshly fetched snapshot.
//!
//! # How the IRM Works
//!
//! The Adaptive Curve IRM has two key components:
//!
//! ## 1. The Curve Function
//!
//! The borrow rate is determined by a curve centered at the target utilization (90%):
//!
//! ```text
//! If utilization >= target (90%):
//!     rate = rate_at_target * (1 + 3 * error)    // Steep increase above target
//! If utilization < target:
//!     rate = rate_at_target * (1 - 0.75 * error) // Gradual decrease below target
//!
//! where error = |utilization - target| / normalization_factor
//! ```
//!
//! This creates an asymmetric curve where rates increase much faster above target
//! than they decrease below it.
//!
//! ## 2. Rate Adaptation
//!
//! The `rate_at_target` itself adapts over time:
//! - **Above target utilization**: `rate_at_target` increases (encourages more supply)
//! - **Below target utilization**: `rate_at_target` decreases (encourages more borrowing)
//! - **Adaptation speed**: 50% per year (e.g., if above target for a full year, rate doubles)
//!
//! # Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TARGET_UTILIZATION` | 90% | Optimal utilization rate |
//! | `CURVE_STEEPNESS` | 4.0 | Rate multiplier at 100% utilization |
//! | `INITIAL_RATE_AT_TARGET` | ~4% APY | Starting rate for new markets |
//! | `ADJUSTMENT_SPEED` | 50%/year | How fast rate_at_target adapts |
//! | `MIN_RATE_AT_TARGET` | 0.1% APY | Minimum rate at target |
//! | `MAX_RATE_AT_TARGET` | 200% APY | Maximum rate at target |
//!
//! # Example
//!
//! ```rust
//! use morpho_liquidity_sim::irm::{get_borrow_rate, TARGET_UTILIZATION, INITIAL_RATE_AT_TARGET};
//! use morpho_liquidity_sim::{WAD, math::rate_to_apy};
//! use alloy_primitives::U256;
//!
//! // Calculate rate at exactly target utilization
//! let result = get_borrow_rate(TARGET_UTILIZATION, INITIAL_RATE_AT_TARGET, 0);
//!
//! // At target, borrow rate equals rate_at_target
//! let apy = rate_to_apy(result.end_borrow_rate);
//! assert!(apy > 0.03 && apy < 0.05); // Around 4% APY
//! ```

use alloy_primitives::U256;

use crate::math::{max, min, w_div_down, w_mul_down, WAD};

/// Curve steepness parameter (4.0 in WAD)
pub const CURVE_STEEPNESS: U256 = U256::from_limbs([4_000_000_000_000_000_000, 0, 0, 0]);

/// Target utilization rate (90% in WAD = 0.9)
pub const TARGET_UTILIZATION: U256 = U256::from_limbs([900_000_000_000_000_000, 0, 0, 0]);

/// Initial rate at target (4% APY / seconds_per_year)
/// 4% = 0.04 WAD = 40_000_000_000_000_000
/// Divided by SECONDS_PER_YEAR (31536000)
pub const INITIAL_RATE_AT_TARGET: U256 = U256::from_limbs([1_268_391_679, 0, 0, 0]);

/// Adjustment speed (50% per year / seconds_per_year)
/// 50% = 0.5 WAD = 500_000_000_000_000_000
/// Divided by SECONDS_PER_YEAR (31536000)
pub const ADJUSTMENT_SPEED: U256 = U256::from_limbs([15_854_895_991, 0, 0, 0]);

/// Minimum rate at target (0.1% APY / seconds_per_year)
pub const MIN_RATE_AT_TARGET: U256 = U256::from_limbs([31_709_791, 0, 0, 0]);

/// Maximum rate at target (200% APY / seconds_per_year)
pub const MAX_RATE_AT_TARGET: U256 = U256::from_limbs([63_419_583_967, 0, 0, 0]);

/// ln(2) scaled by WAD
pub const LN_2_INT: i128 = 693_147_180_559_945_309;

/// ln(1e-18) scaled by WAD (negative)
pub const LN_WEI_INT: i128 = -41_446_531_673_892_822_312;

/// Upper bound for wExp to avoid overflow
pub const WEXP_UPPER_BOUND: i128 = 93_859_467_695_000_404_319;

/// Value of wExp at upper bound
/// 57716089161558943949701069502944508345128422502756744429568 in little-endian u64 limbs
pub const WEXP_UPPER_VALUE: U256 = U256::from_limbs([
    0x3216C1AD5D72C200,  // Low 64 bits
    0x09BA5D32E9C0DE49,
    0x80,
    0,
]);

/// Result of borrow rate calculation
#[derive(Debug, Clone)]
pub struct BorrowRateResult {
    /// Average borrow rate over the period (WAD-scaled per second)
    pub avg_borrow_rate: U256,
    /// End borrow rate (instantaneous rate at end of period)
    pub end_borrow_rate: U256,
    /// New rate at target after the period
    pub end_rate_at_target: U256,
}

/// Approximation of exp(x) used by the Adaptive Curve IRM.
///
/// Uses the decomposition: e^x = 2^q * e^r where x = q*ln(2) + r
/// with -ln(2)/2 <= r <= ln(2)/2
pub fn w_exp(x: i128) -> U256 {
    // If x < ln(1e-18) then exp(x) < 1e-18 so it is rounded to zero
    if x < LN_WEI_INT {
        return U256::ZERO;
    }

    // Clip to avoid overflow
    if x >= WEXP_UPPER_BOUND {
        return WEXP_UPPER_VALUE;
    }

    // Decompose x as x = q * ln(2) + r
    // q = x / ln(2) rounded half toward zero
    let rounding_adjustment = if x < 0 { -(LN_2_INT / 2) } else { LN_2_INT / 2 };
    let q = (x + rounding_adjustment) / LN_2_INT;
    let r = x - q * LN_2_INT;

    // Compute e^r with a 2nd-order Taylor polynomial
    // e^r ≈ 1 + r + r²/2
    let wad_i128 = WAD.saturating_to::<i128>();
    let r_squared = (r * r) / wad_i128 / 2;
    let exp_r = wad_i128 + r + r_squared;

    // Convert to U256 for final calculation
    let exp_r_u256 = U256::from(exp_r.unsigned_abs());

    // Return e^x = 2^q * e^r
    if q >= 0 {
        exp_r_u256 << (q as usize)
    } else {
        exp_r_u256 >> ((-q) as usize)
    }
}

/// Calculates the borrow rate for the Adaptive Curve IRM.
///
/// This is the core IRM function that computes both the instantaneous borrow rate
/// and the adapted `rate_at_target` after a given time period.
///
/// # Rate Calculation
///
/// The function performs these steps:
/// 1. Calculate utilization error from target (90%)
/// 2. Compute `rate_at_target` adaptation based on error and elapsed time
/// 3. Apply the curve function to get the final borrow rate
///
/// # Arguments
///
/// * `utilization` - Current market utilization (WAD-scaled, 0 to 1e18)
/// * `rate_at_target` - Current rate at target utilization (per-second, WAD-scaled).
///   Pass `U256::ZERO` for first interaction (will use `INITIAL_RATE_AT_TARGET`).
/// * `elapsed` - Time since last update in seconds
///
/// # Returns
///
/// A [`BorrowRateResult`] containing:
/// - `avg_borrow_rate`: Average borrow rate over the elapsed period (for interest accrual)
/// - `end_borrow_rate`: Instantaneous rate at the end (current rate)
/// - `end_rate_at_target`: Updated rate at target after adaptation
///
/// # Example
///
/// ```rust
/// use morpho_liquidity_sim::irm::{get_borrow_rate, TARGET_UTILIZATION, INITIAL_RATE_AT_TARGET};
/// use morpho_liquidity_sim::{WAD, math::rate_to_apy};
/// use alloy_primitives::U256;
///
/// // High utilization (95%) should give higher rate
/// let high_util = U256::from(950_000_000_000_000_000u64);
/// let result = get_borrow_rate(high_util, INITIAL_RATE_AT_TARGET, 0);
/// assert!(result.end_borrow_rate > INITIAL_RATE_AT_TARGET);
///
/// // Low utilization (50%) should give lower rate
/// let low_util = U256::from(500_000_000_000_000_000u64);
/// let result_low = get_borrow_rate(low_util, INITIAL_RATE_AT_TARGET, 0);
/// assert!(result_low.end_borrow_rate < INITIAL_RATE_AT_TARGET);
///
/// // After 1 day at high utilization, rate_at_target increases
/// let one_day = 86400u64;
/// let adapted = get_borrow_rate(high_util, INITIAL_RATE_AT_TARGET, one_day);
/// assert!(adapted.end_rate_at_target > INITIAL_RATE_AT_TARGET);
/// ```
pub fn get_borrow_rate(utilization: U256, rate_at_target: U256, elapsed: u64) -> BorrowRateResult {
    let error = UtilizationError::new(utilization);

    let (avg_rate_at_target, end_rate_at_target) = if rate_at_target.is_zero() {
        // First interaction
        (INITIAL_RATE_AT_TARGET, INITIAL_RATE_AT_TARGET)
    } else {
        // The sign of the adaptation follows the sign of the error
        let speed = w_mul_down(ADJUSTMENT_SPEED, error.magnitude);
        let linear_adaptation = speed.saturating_mul(U256::from(elapsed));

        if linear_adaptation.is_zero() {
            (rate_at_target, rate_at_target)
        } else {
            let end_rate = adapt_rate_at_target(rate_at_target, linear_adaptation, error.negative);

            // Trapezoidal average of the start, mid and end rates
            let mid_rate =
                adapt_rate_at_target(rate_at_target, linear_adaptation / U256::from(2), error.negative);
            let avg_rate = (rate_at_target + end_rate + U256::from(2) * mid_rate) / U256::from(4);

            (avg_rate, end_rate)
        }
    };

    BorrowRateResult {
        avg_borrow_rate: error.curve(avg_rate_at_target),
        end_borrow_rate: error.curve(end_rate_at_target),
        end_rate_at_target,
    }
}

/// Instantaneous borrow rate at `utilization`, without any time adaptation.
///
/// Markets without an adaptive IRM (`rate_at_target == None`) borrow at zero.
/// Utilization above 100% is treated as 100%.
pub fn borrow_rate_at(utilization: U256, rate_at_target: Option<U256>) -> U256 {
    match rate_at_target {
        None => U256::ZERO,
        Some(rate_at_target) => {
            get_borrow_rate(min(utilization, WAD), rate_at_target, 0).end_borrow_rate
        }
    }
}

/// Normalized distance between a utilization and [`TARGET_UTILIZATION`].
#[derive(Debug, Clone, Copy)]
struct UtilizationError {
    magnitude: U256,
    negative: bool,
}

impl UtilizationError {
    fn new(utilization: U256) -> Self {
        if utilization >= TARGET_UTILIZATION {
            Self {
                magnitude: w_div_down(utilization - TARGET_UTILIZATION, WAD - TARGET_UTILIZATION),
                negative: false,
            }
        } else {
            Self {
                magnitude: w_div_down(TARGET_UTILIZATION - utilization, TARGET_UTILIZATION),
                negative: true,
            }
        }
    }

    /// `rate * (1 + coeff * err)`, where the coefficient depends on the side of the target.
    fn curve(self, rate: U256) -> U256 {
        if self.negative {
            let coeff = WAD - w_div_down(WAD, CURVE_STEEPNESS);
            let factor = WAD.saturating_sub(w_mul_down(coeff, self.magnitude));
            w_mul_down(factor, rate)
        } else {
            let coeff = CURVE_STEEPNESS - WAD;
            let factor = WAD + w_mul_down(coeff, self.magnitude);
            w_mul_down(factor, rate)
        }
    }
}

/// `rate_at_target * e^(+-adaptation)`, clamped to the allowed range.
fn adapt_rate_at_target(rate_at_target: U256, adaptation: U256, negative: bool) -> U256 {
    let exponent = adaptation.saturating_to::<i128>();
    let exponent = if negative { -exponent } else { exponent };
    let raw_rate = w_mul_down(rate_at_target, w_exp(exponent));
    min(max(raw_rate, MIN_RATE_AT_TARGET), MAX_RATE_AT_TARGET)
}
