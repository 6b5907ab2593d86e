//! Single borrow simulation with public allocator reallocation.

use alloy_primitives::U256;
use anyhow::{bail, Result};
use morpho_liquidity_api::{ClientConfig, MorphoApiClient};

use crate::cli::{BorrowArgs, OutputFormat};
use crate::output::format_borrow_result;

/// Prints the report, then fails if the simulation reported an error.
pub async fn run_borrow(args: &BorrowArgs, config: ClientConfig, format: OutputFormat) -> Result<()> {
    let client = MorphoApiClient::with_config(config);
    let chain = args.market.chain.0;

    let result = client
        .fetch_market_simulation_borrow(&args.market.market_id, chain, U256::from(args.amount))
        .await;

    match format {
        OutputFormat::Table => {
            println!("{}", format_borrow_result(&result));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
    }

    if !result.is_success() {
        bail!("{}", result.reason.message);
    }
    Ok(())
}
