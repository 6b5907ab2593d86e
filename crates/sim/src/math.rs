//! Fixed-point math helpers mirroring Morpho Blue's `MathLib` and `SharesMathLib`.
//!
//! All ratios are WAD-scaled (`1e18`). Products are computed in 512 bits so that
//! very large operands (seeded collateral, oracle prices) never wrap; results
//! that do not fit back into 256 bits saturate at `U256::MAX`.

use alloy_primitives::{U256, U512};

/// 1e18, the fixed-point unit.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: U256 = U256::from_limbs([31_536_000, 0, 0, 0]);

/// Virtual shares added to every market's share supply (1e6).
pub const VIRTUAL_SHARES: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// Virtual assets added to every market's asset total.
pub const VIRTUAL_ASSETS: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Rounding direction for fixed-point division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingDirection {
    /// Round toward positive infinity.
    Up,
    /// Round toward zero.
    Down,
}

/// Computes `x * y / denominator` with the given rounding.
///
/// A zero denominator saturates to `U256::MAX` (or zero when the numerator is zero).
pub fn mul_div(x: U256, y: U256, denominator: U256, rounding: RoundingDirection) -> U256 {
    let numerator = U512::from(x) * U512::from(y);
    if denominator.is_zero() {
        return if numerator.is_zero() {
            U256::ZERO
        } else {
            U256::MAX
        };
    }

    let denominator = U512::from(denominator);
    let quotient = numerator / denominator;
    let quotient = match rounding {
        RoundingDirection::Down => quotient,
        RoundingDirection::Up if (numerator % denominator).is_zero() => quotient,
        RoundingDirection::Up => quotient + U512::from(1u8),
    };

    U256::saturating_from(quotient)
}

/// `x * y / denominator`, rounded down.
pub fn mul_div_down(x: U256, y: U256, denominator: U256) -> U256 {
    mul_div(x, y, denominator, RoundingDirection::Down)
}

/// `x * y / denominator`, rounded up.
pub fn mul_div_up(x: U256, y: U256, denominator: U256) -> U256 {
    mul_div(x, y, denominator, RoundingDirection::Up)
}

/// `x * y / WAD`, rounded down.
pub fn w_mul_down(x: U256, y: U256) -> U256 {
    mul_div_down(x, y, WAD)
}

/// `x * y / WAD`, rounded up.
pub fn w_mul_up(x: U256, y: U256) -> U256 {
    mul_div_up(x, y, WAD)
}

/// `x * WAD / y`, rounded down.
pub fn w_div_down(x: U256, y: U256) -> U256 {
    mul_div_down(x, WAD, y)
}

/// `x * WAD / y`, rounded up.
pub fn w_div_up(x: U256, y: U256) -> U256 {
    mul_div_up(x, WAD, y)
}

/// Third-order Taylor expansion of `e^(x * n) - 1`, as used for interest compounding.
pub fn w_taylor_compounded(x: U256, n: U256) -> U256 {
    let first_term = x.saturating_mul(n);
    let second_term = mul_div_down(first_term, first_term, WAD * U256::from(2));
    let third_term = mul_div_down(second_term, first_term, WAD * U256::from(3));

    first_term
        .saturating_add(second_term)
        .saturating_add(third_term)
}

/// `x - y`, floored at zero.
pub fn zero_floor_sub(x: U256, y: U256) -> U256 {
    x.saturating_sub(y)
}

pub fn min(x: U256, y: U256) -> U256 {
    if x < y {
        x
    } else {
        y
    }
}

pub fn max(x: U256, y: U256) -> U256 {
    if x > y {
        x
    } else {
        y
    }
}

/// Converts shares to assets using virtual shares and assets.
pub fn shares_to_assets(
    shares: U256,
    total_assets: U256,
    total_shares: U256,
    rounding: RoundingDirection,
) -> U256 {
    mul_div(
        shares,
        total_assets.saturating_add(VIRTUAL_ASSETS),
        total_shares.saturating_add(VIRTUAL_SHARES),
        rounding,
    )
}

/// Converts assets to shares using virtual shares and assets.
pub fn assets_to_shares(
    assets: U256,
    total_assets: U256,
    total_shares: U256,
    rounding: RoundingDirection,
) -> U256 {
    mul_div(
        assets,
        total_shares.saturating_add(VIRTUAL_SHARES),
        total_assets.saturating_add(VIRTUAL_ASSETS),
        rounding,
    )
}

/// Compounds a per-second WAD rate over a year: `e^(rate * SECONDS_PER_YEAR) - 1`, WAD-scaled.
pub fn rate_to_apy_wad(rate: U256) -> U256 {
    w_taylor_compounded(rate, SECONDS_PER_YEAR)
}

/// Converts a per-second WAD rate to an annualized APY as a decimal (0.05 = 5%).
pub fn rate_to_apy(rate: U256) -> f64 {
    let rate_per_second = rate_to_f64(rate);
    (rate_per_second * 31_536_000.0).exp_m1()
}

/// Converts a WAD-scaled value to `f64`.
pub fn rate_to_f64(value: U256) -> f64 {
    value.saturating_to::<u128>() as f64 / 1e18
}

/// Converts a WAD-scaled fraction to a percentage (`0.5 WAD` -> `50.0`).
pub fn wad_to_percent(value: U256) -> f64 {
    rate_to_f64(value) * 100.0
}
