//! Command implementations.

pub mod borrow;
pub mod series;

use anyhow::Result;
use morpho_liquidity_api::ClientConfig;

pub use borrow::run_borrow;
pub use series::run_series;

/// Create a ClientConfig with an optional API URL.
pub fn client_config(api_url: Option<&str>, no_policy: bool) -> Result<ClientConfig> {
    let config = ClientConfig::new().with_fetch_policy(!no_policy);
    if let Some(url) = api_url {
        Ok(config.with_api_url(url.parse()?))
    } else {
        Ok(config)
    }
}
