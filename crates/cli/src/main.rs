//! Morpho Liquidity CLI - simulate borrows and public allocator reallocations.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{client_config, run_borrow, run_series};

/// Log to stderr so JSON on stdout stays parseable. `RUST_LOG` overrides the default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = client_config(cli.api_url.as_deref(), cli.no_policy)?;

    match cli.command {
        Commands::Series(args) => {
            run_series(&args, config, cli.format).await?;
        }
        Commands::Borrow(args) => {
            run_borrow(&args, config, cli.format).await?;
        }
    }

    Ok(())
}
