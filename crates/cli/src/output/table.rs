//! Table formatting for simulation series and market figures.

use morpho_liquidity_api::sim::{MarketFigures, SimulationSeries};
use morpho_liquidity_api::Asset;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use super::format::{format_amount, format_percent, format_wad_percent};

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Percentage")]
    percentage: String,
    #[tabled(rename = "Borrow Amount")]
    borrow_amount: String,
    #[tabled(rename = "Utilization")]
    utilization: String,
    #[tabled(rename = "Borrow APY")]
    borrow_apy: String,
    #[tabled(rename = "Degraded")]
    degraded: String,
}

#[derive(Tabled)]
struct FiguresRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Liquidity")]
    liquidity: String,
    #[tabled(rename = "Utilization")]
    utilization: String,
    #[tabled(rename = "Borrow APY")]
    borrow_apy: String,
}

/// Indices of the `steps` evenly spaced points printed from a series of `len` points.
pub fn sample_indices(len: usize, steps: usize) -> Vec<usize> {
    let steps = steps.max(1);
    let stride = (len / steps).max(1);
    (0..len).step_by(stride).take(steps).collect()
}

pub fn format_series_table(series: &SimulationSeries, loan_asset: &Asset, steps: usize) -> String {
    if series.points.is_empty() {
        return "No simulation points.".to_string();
    }

    let rows: Vec<SeriesRow> = sample_indices(series.points.len(), steps)
        .into_iter()
        .filter_map(|i| series.points.get(i))
        .map(|point| SeriesRow {
            percentage: format!("{:.0}%", point.percentage),
            borrow_amount: format_amount(point.borrow_amount, loan_asset),
            utilization: format_percent(point.utilization),
            borrow_apy: format_percent(point.borrow_apy),
            degraded: if point.degraded { "yes" } else { "-" }.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()));

    table.to_string()
}

/// One row per named stage of a market.
pub fn format_figures_table(stages: &[(&str, &MarketFigures)], loan_asset: &Asset) -> String {
    let rows: Vec<FiguresRow> = stages
        .iter()
        .map(|(stage, figures)| FiguresRow {
            stage: stage.to_string(),
            liquidity: format_amount(figures.liquidity, loan_asset),
            utilization: format_wad_percent(figures.utilization),
            borrow_apy: format_wad_percent(figures.borrow_apy),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()));

    table.to_string()
}
