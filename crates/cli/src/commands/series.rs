//! Utilization and borrow APY curve of a market.

use anyhow::Result;
use morpho_liquidity_api::{ClientConfig, MarketSimulationSeries, MorphoApiClient};

use crate::cli::{OutputFormat, SeriesArgs};
use crate::output::format::format_amount;
use crate::output::format_series_table;

pub async fn run_series(args: &SeriesArgs, config: ClientConfig, format: OutputFormat) -> Result<()> {
    let client = MorphoApiClient::with_config(config);
    let chain = args.market.chain.0;
    let market_id = args.market.market_id.as_str();

    let (snapshot, series) = client.get_market_simulation_series(market_id, chain).await?;

    match format {
        OutputFormat::Table => {
            println!(
                "Market {} on {} ({} reachable liquidity)",
                market_id,
                chain,
                format_amount(series.initial_liquidity, &snapshot.loan_asset)
            );
            let steps = usize::try_from(args.steps).unwrap_or(usize::MAX);
            println!("{}", format_series_table(&series, &snapshot.loan_asset, steps));
            let degraded = series.degraded_count();
            if degraded > 0 {
                println!("{} point(s) carried forward after a failed simulation", degraded);
            }
        }
        OutputFormat::Json => {
            let report = MarketSimulationSeries::from_series(chain, market_id, &series);
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
    }

    Ok(())
}
