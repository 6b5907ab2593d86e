//! CLI argument definitions using clap.

use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use morpho_liquidity_api::{chain_from_id, NamedChain};

/// Default market: USDC / cbBTC on Base.
pub const DEFAULT_MARKET_ID: &str =
    "0x9103c3b4e834476c9a62ea009ba2c884ee42e94e6e314a26f04d312434191836";

/// Morpho Liquidity CLI - simulate borrows against public allocator liquidity
#[derive(Parser, Debug)]
#[command(name = "morpho-liquidity")]
#[command(
    about = "Simulate Morpho Blue borrows with public allocator reallocations",
    long_about = None
)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Morpho GraphQL API URL
    #[arg(long, global = true, env = "MORPHO_API_URL")]
    pub api_url: Option<String>,

    /// Skip fetching utilization targets; nothing is reallocated
    #[arg(long, global = true)]
    pub no_policy: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Utilization and borrow APY from 0% to 100% of reachable liquidity
    Series(SeriesArgs),
    /// Simulate a single borrow, reallocating liquidity when needed
    Borrow(BorrowArgs),
}

#[derive(Args, Debug)]
pub struct MarketArgs {
    /// Market unique key
    #[arg(short = 'm', long, default_value = DEFAULT_MARKET_ID)]
    pub market_id: String,

    /// Chain the market is on (name or chain id)
    #[arg(short = 'c', long, default_value = "base")]
    pub chain: ChainArg,
}

#[derive(Parser, Debug)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub market: MarketArgs,

    /// Number of rows to print
    #[arg(short = 's', long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub steps: u64,
}

#[derive(Parser, Debug)]
pub struct BorrowArgs {
    #[command(flatten)]
    pub market: MarketArgs,

    /// Amount to borrow in whole loan tokens (e.g., 1000000 for 1M USDC)
    #[arg(short = 'a', long)]
    pub amount: u128,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Wrapper for NamedChain that implements FromStr with aliases
#[derive(Clone, Copy, Debug)]
pub struct ChainArg(pub NamedChain);

impl FromStr for ChainArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let chain = match name.as_str() {
            "ethereum" | "eth" | "mainnet" => NamedChain::Mainnet,
            "arb" => NamedChain::Arbitrum,
            "op" => NamedChain::Optimism,
            "matic" => NamedChain::Polygon,
            "worldchain" => NamedChain::World,
            "stable" => NamedChain::StableMainnet,
            _ => match name.parse::<i64>() {
                Ok(id) => chain_from_id(id).ok_or_else(|| format!("Unknown chain: {}", s))?,
                Err(_) => name
                    .parse::<NamedChain>()
                    .map_err(|_| format!("Unknown chain: {}", s))?,
            },
        };
        Ok(ChainArg(chain))
    }
}

impl std::fmt::Display for ChainArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
