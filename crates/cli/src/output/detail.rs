//! Detailed output for a single borrow simulation.

use colored::Colorize;
use morpho_liquidity_api::{ReallocationResult, ReasonKind};

use super::format::{format_amount, format_wad_percent, truncate_address};
use super::table::format_figures_table;

pub fn format_borrow_result(result: &ReallocationResult) -> String {
    let mut output = String::new();

    // Header
    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("{}\n", "Borrow Simulation".bold()));
    output.push_str(&format!("{}\n\n", "=".repeat(60)));

    output.push_str(&format!("  Market:    {}\n", result.market_id));
    output.push_str(&format!("  Chain:     {}\n", result.chain));
    output.push_str(&format!("  Requested: {} tokens\n", result.requested_liquidity));

    let Some(metrics) = &result.api_metrics else {
        output.push('\n');
        output.push_str(&format_reason(result));
        return output;
    };
    let loan = &metrics.loan_asset;
    let collateral = metrics
        .collateral_asset
        .as_ref()
        .map(|asset| asset.symbol.as_str())
        .unwrap_or("N/A");

    output.push_str(&format!("  Pair:      {} / {}\n", loan.symbol, collateral));
    output.push_str(&format!("  LLTV:      {}\n\n", format_wad_percent(metrics.lltv)));

    // Market before simulation
    output.push_str(&format!("{}\n", "Market".cyan().bold()));
    output.push_str(&format!(
        "  Liquidity:               {}\n",
        format_amount(result.current_market_liquidity, loan)
    ));
    output.push_str(&format!(
        "  Reallocatable Liquidity: {}\n",
        format_amount(metrics.reallocatable_liquidity, loan)
    ));
    output.push_str(&format!(
        "  Utilization:             {}\n\n",
        format_wad_percent(metrics.utilization)
    ));

    if let Some(simulation) = &result.simulation {
        let target = &simulation.target;
        output.push_str(&format!("{}\n", "Target Market".cyan().bold()));
        output.push_str(&format_figures_table(
            &[
                ("Before", &target.pre_reallocation),
                ("After Reallocation", &target.post_reallocation),
                ("After Borrow", &target.post_borrow),
            ],
            loan,
        ));
        output.push_str("\n\n");

        for source in &simulation.sources {
            output.push_str(&format!(
                "{} {} ({} reallocated)\n",
                "Source Market".cyan().bold(),
                truncate_address(&source.market_id.to_string()),
                format_amount(source.reallocated_amount, loan)
            ));
            output.push_str(&format_figures_table(
                &[
                    ("Before", &source.pre_reallocation),
                    ("After", &source.post_reallocation),
                ],
                loan,
            ));
            output.push_str("\n\n");
        }
    }

    if let Some(reallocation) = &result.reallocation {
        output.push_str(&format!("{}\n", "Reallocation".cyan().bold()));
        output.push_str(&format!(
            "  Needed:        {}\n",
            format_amount(reallocation.liquidity_needed_from_reallocation, loan)
        ));
        output.push_str(&format!(
            "  Reallocatable: {}\n",
            format_amount(reallocation.reallocatable_liquidity, loan)
        ));
        output.push_str(&format!(
            "  Reallocated:   {}\n",
            format_amount(reallocation.total_reallocated, loan)
        ));
        let matched = if reallocation.is_liquidity_fully_matched {
            "Yes".green()
        } else {
            "No".red()
        };
        output.push_str(&format!("  Fully Matched: {}\n", matched));
        if !reallocation.liquidity_shortfall.is_zero() {
            output.push_str(&format!(
                "  Shortfall:     {}\n",
                format_amount(reallocation.liquidity_shortfall, loan)
            ));
        }

        for vault in &reallocation.withdrawals {
            let name = metrics
                .public_allocator_shared_liquidity
                .iter()
                .find(|shared| shared.vault == vault.vault)
                .map(|shared| shared.vault_name.as_str())
                .unwrap_or("-");
            output.push_str(&format!(
                "  {} {}\n",
                name,
                truncate_address(&vault.vault.to_string())
            ));
            for withdrawal in &vault.withdrawals {
                output.push_str(&format!(
                    "    {} <- {}\n",
                    format_amount(withdrawal.amount, loan),
                    truncate_address(&withdrawal.market_id.to_string())
                ));
            }
        }
        output.push('\n');
    }

    output.push_str(&format_reason(result));
    output
}

fn format_reason(result: &ReallocationResult) -> String {
    match result.reason.kind {
        ReasonKind::Success => format!("{}\n", result.reason.message.green()),
        ReasonKind::Error => format!("{} {}\n", "Error:".red().bold(), result.reason.message),
    }
}
