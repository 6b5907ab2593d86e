//! GraphQL scalar type conversions to Rust/alloy types.
//!
//! The Morpho API serializes `BigInt` either as a decimal string or as a JSON
//! number, so the deserializers here accept both.

use alloy_primitives::{Address, FixedBytes, U256};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use morpho_liquidity_sim::{MarketId, WAD};

/// Raw GraphQL BigInt as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlexBigInt {
    Text(String),
    Integer(u64),
    Float(f64),
}

impl FlexBigInt {
    fn to_u256(&self) -> Option<U256> {
        match self {
            FlexBigInt::Text(s) => parse_bigint(s),
            FlexBigInt::Integer(n) => Some(U256::from(*n)),
            FlexBigInt::Float(f) if f.is_finite() && *f >= 0.0 => {
                Some(U256::from(f.trunc() as u128))
            }
            FlexBigInt::Float(_) => None,
        }
    }
}

/// Parse a GraphQL Address string into an alloy Address.
pub fn parse_address(s: &str) -> Option<Address> {
    Address::from_str(s).ok()
}

/// Parse a GraphQL BigInt string into a U256.
pub fn parse_bigint(s: &str) -> Option<U256> {
    U256::from_str(s).ok()
}

/// Parse a market unique key (`0x` + 64 hex chars).
pub fn parse_market_id(s: &str) -> Option<MarketId> {
    FixedBytes::<32>::from_str(s).ok()
}

/// Convert a decimal fraction (`0.9` = 90%) into a WAD-scaled value, rounding down.
pub fn fraction_to_wad(value: f64) -> U256 {
    if !value.is_finite() || value <= 0.0 {
        return U256::ZERO;
    }
    let scaled = (value * 1e18).floor();
    if scaled >= u128::MAX as f64 {
        return U256::from(u128::MAX);
    }
    U256::from(scaled as u128).min(WAD.saturating_mul(U256::from(u64::MAX)))
}

/// Deserialize an optional address from GraphQL response.
pub fn deserialize_optional_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| parse_address(&s)))
}

/// Deserialize an optional BigInt from GraphQL response into U256.
///
/// Unparsable values become `None`.
pub fn deserialize_optional_bigint<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<FlexBigInt> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|raw| raw.to_u256()))
}

/// Deserialize a BigInt from GraphQL response into U256.
pub fn deserialize_bigint<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = FlexBigInt::deserialize(deserializer)?;
    raw.to_u256()
        .ok_or_else(|| serde::de::Error::custom(format!("Invalid BigInt: {:?}", raw)))
}
