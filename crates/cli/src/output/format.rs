//! Shared value formatting.

use alloy_primitives::U256;
use morpho_liquidity_api::sim::wad_to_percent;
use morpho_liquidity_api::Asset;

pub fn truncate_address(addr: &str) -> String {
    if addr.len() > 10 {
        format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
    } else {
        addr.to_string()
    }
}

/// USD value with a K/M/B/T suffix.
pub fn format_usd(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 1e12 => format!("${:.2}T", v / 1e12),
        Some(v) if v >= 1e9 => format!("${:.2}B", v / 1e9),
        Some(v) if v >= 1e6 => format!("${:.2}M", v / 1e6),
        Some(v) if v >= 1e3 => format!("${:.2}K", v / 1e3),
        Some(v) if v > 0.0 && v < 0.01 => "<$0.01".to_string(),
        Some(v) => format!("${:.2}", v),
        None => "-".to_string(),
    }
}

/// Token amount with its USD value when the price is known.
pub fn format_amount(amount: U256, asset: &Asset) -> String {
    let tokens = asset.to_tokens(amount);
    match asset.usd_value(amount) {
        Some(usd) => format!("{:.2} {} ({})", tokens, asset.symbol, format_usd(Some(usd))),
        None => format!("{:.2} {}", tokens, asset.symbol),
    }
}

/// Percentage with two decimals.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// WAD-scaled fraction as a percentage.
pub fn format_wad_percent(value: U256) -> String {
    format_percent(wad_to_percent(value))
}
