//! ERC-20 metadata of a market's loan and collateral tokens.

use alloy_primitives::{utils::format_units, Address, U256};
use serde::{Deserialize, Serialize};

use super::scalars::parse_address;

/// A loan or collateral token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub address: Address,
    /// Token symbol (e.g., "USDC").
    pub symbol: String,
    pub name: Option<String>,
    pub decimals: u8,
    /// USD price reported by the API, when indexed.
    pub price_usd: Option<f64>,
}

impl Asset {
    /// Build from the API's asset fields.
    ///
    /// Returns `None` if `address` is not a 20-byte hex string. The API
    /// reports `decimals` as a float; it is truncated into `u8`.
    pub fn from_gql(
        address: &str,
        symbol: String,
        name: Option<String>,
        decimals: f64,
        price_usd: Option<f64>,
    ) -> Option<Self> {
        Some(Asset {
            address: parse_address(address)?,
            symbol,
            name,
            decimals: decimals as u8,
            price_usd,
        })
    }

    /// `amount` base units as whole tokens.
    pub fn to_tokens(&self, amount: U256) -> f64 {
        format_units(amount, self.decimals)
            .ok()
            .and_then(|tokens| tokens.parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    }

    /// USD value of `amount` base units, when the price is known.
    pub fn usd_value(&self, amount: U256) -> Option<f64> {
        self.price_usd.map(|price| self.to_tokens(amount) * price)
    }
}
