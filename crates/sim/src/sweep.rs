//! Utilization / borrow APY curve generation.
//!
//! A sweep evaluates one borrow scenario per point, at evenly spaced fractions
//! of a maximum borrowable amount. Points are independent hypotheticals over the
//! same snapshot, so they may run in parallel on the rayon pool; results are
//! reassembled in ascending order by index.
//!
//! A point whose simulation fails does not abort the sweep. It repeats the
//! previous point's utilization and APY (zeros for the first point), is flagged
//! `degraded`, and a warning is logged.

use alloy_primitives::U256;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::{mul_div_down, wad_to_percent};

/// Default number of points, 0% to 100% in steps of 1%.
pub const DEFAULT_SWEEP_POINTS: usize = 101;

/// Sweep configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Number of points, including both 0% and 100%
    pub points: usize,
    /// Evaluate points on the rayon thread pool
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            points: DEFAULT_SWEEP_POINTS,
            parallel: true,
        }
    }
}

impl SweepConfig {
    /// Borrow amount and percentage of each point.
    pub fn schedule(&self, max_liquidity: U256) -> Vec<(f64, U256)> {
        let intervals = self.points.saturating_sub(1).max(1);
        (0..self.points)
            .map(|index| {
                let percentage = index as f64 * 100.0 / intervals as f64;
                let amount = mul_div_down(max_liquidity, U256::from(index), U256::from(intervals));
                (percentage, amount)
            })
            .collect()
    }
}

/// Target market figures after one simulated borrow, WAD-scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointMetrics {
    pub utilization: U256,
    pub borrow_apy: U256,
}

/// One point of a simulated curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Fraction of the maximum borrowable amount, in percent
    pub percentage: f64,
    /// Simulated borrow amount in loan token base units
    pub borrow_amount: U256,
    /// Target utilization after the borrow, in percent
    pub utilization: f64,
    /// Target borrow APY after the borrow, in percent
    pub borrow_apy: f64,
    /// Values were carried forward from the previous point
    pub degraded: bool,
}

/// A full utilization / APY curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSeries {
    /// Idle liquidity plus everything reallocatable, the 100% borrow amount
    pub initial_liquidity: U256,
    /// Points in ascending percentage order
    pub points: Vec<SeriesPoint>,
}

impl SimulationSeries {
    pub fn percentages(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.percentage).collect()
    }

    pub fn borrow_amounts(&self) -> Vec<U256> {
        self.points.iter().map(|point| point.borrow_amount).collect()
    }

    pub fn utilization_series(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.utilization).collect()
    }

    pub fn apy_series(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.borrow_apy).collect()
    }

    pub fn degraded(&self) -> Vec<bool> {
        self.points.iter().map(|point| point.degraded).collect()
    }

    /// Number of points whose values were carried forward
    pub fn degraded_count(&self) -> usize {
        self.points.iter().filter(|point| point.degraded).count()
    }
}

/// Runs a sweep, evaluating each borrow amount with `simulate`.
///
/// `simulate` receives the borrow amount and returns the target market's
/// figures after the borrow.
pub fn run_with<F>(config: &SweepConfig, max_liquidity: U256, simulate: F) -> SimulationSeries
where
    F: Fn(U256) -> Result<PointMetrics, SimError> + Sync,
{
    let schedule = config.schedule(max_liquidity);

    let mut results: Vec<(usize, Result<PointMetrics, SimError>)> = if config.parallel {
        schedule
            .par_iter()
            .enumerate()
            .map(|(index, (_, amount))| (index, simulate(*amount)))
            .collect()
    } else {
        schedule
            .iter()
            .enumerate()
            .map(|(index, (_, amount))| (index, simulate(*amount)))
            .collect()
    };
    results.sort_by_key(|(index, _)| *index);

    let mut previous = PointMetrics::default();
    let points = schedule
        .into_iter()
        .zip(results)
        .map(|((percentage, borrow_amount), (_, result))| {
            let (metrics, degraded) = match result {
                Ok(metrics) => (metrics, false),
                Err(err) => {
                    tracing::warn!(
                        percentage,
                        borrow_amount = %borrow_amount,
                        error = %err,
                        "simulation point failed, carrying forward previous values"
                    );
                    (previous, true)
                }
            };
            previous = metrics;

            SeriesPoint {
                percentage,
                borrow_amount,
                utilization: wad_to_percent(metrics.utilization),
                borrow_apy: wad_to_percent(metrics.borrow_apy),
                degraded,
            }
        })
        .collect();

    SimulationSeries {
        initial_liquidity: max_liquidity,
        points,
    }
}
