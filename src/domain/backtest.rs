//! Signal-driven backtest simulator.
//!
//! Replays an SMA crossover signal against one asset's adjusted closes.
//! The equity curve starts at 1.0 and is updated with a one-period lag:
//! the exposure decided at the close of day t earns the return from t to
//! t+1. No transaction costs or slippage are modelled.

use crate::domain::error::QuantError;
use crate::domain::indicator::calculate_sma;
use crate::domain::metrics::{EquityPoint, PerformanceStats, TRADING_DAYS_PER_YEAR};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::{count_exposure_changes, sma_crossover, CrossoverWindows, SignalPoint};
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub periods_per_year: f64,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub code: String,
    pub equity_curve: Vec<EquityPoint>,
    pub signals: Vec<SignalPoint>,
    pub exposure_changes: usize,
    pub stats: PerformanceStats,
}

/// Portfolio value path for a single asset under lagged target weights.
///
/// `v[0] = 1.0` and `v[t] = v[t-1] * (1 + weights[t-1] * ret[t])` with
/// `ret[t] = prices[t] / prices[t-1] - 1`. `weights[t]` is never applied to
/// `ret[t]`, so a decision cannot trade on the return it observed.
pub fn simulate_equity(prices: &[f64], weights: &[f64]) -> Result<Vec<f64>, QuantError> {
    if prices.len() != weights.len() {
        return Err(QuantError::invalid(format!(
            "{} prices but {} weights",
            prices.len(),
            weights.len()
        )));
    }
    if prices.is_empty() {
        return Ok(Vec::new());
    }

    let mut equity = Vec::with_capacity(prices.len());
    equity.push(1.0);
    for t in 1..prices.len() {
        let ret = prices[t] / prices[t - 1] - 1.0;
        let prev = equity[t - 1];
        equity.push(prev * (1.0 + weights[t - 1] * ret));
    }
    Ok(equity)
}

pub fn run_backtest(
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, QuantError> {
    let windows = CrossoverWindows::new(config.short_window, config.long_window)?;

    // With len <= long window the long average has at most one defined
    // point, whose decision has no later return to act on.
    if series.len() <= windows.long() {
        return Err(QuantError::InsufficientData {
            code: series.code().to_string(),
            rows: series.len(),
            minimum: windows.long() + 1,
        });
    }

    let sma_short = calculate_sma(series, windows.short())?;
    let sma_long = calculate_sma(series, windows.long())?;
    let signals = sma_crossover(&sma_short, &sma_long)?;

    let prices = series.adjusted_closes();
    let weights: Vec<f64> = signals.iter().map(|s| s.weight).collect();
    let equity = simulate_equity(&prices, &weights)?;

    let equity_curve: Vec<EquityPoint> = series
        .bars()
        .iter()
        .zip(equity)
        .map(|(bar, equity)| EquityPoint {
            date: bar.date,
            equity,
        })
        .collect();

    let stats = PerformanceStats::from_equity_curve(
        &equity_curve,
        config.periods_per_year,
        config.risk_free_rate,
    );
    let exposure_changes = count_exposure_changes(&signals);

    log::debug!(
        "{}: SMA({})/SMA({}) backtest over {} periods, {} exposure changes",
        series.code(),
        windows.short(),
        windows.long(),
        equity_curve.len(),
        exposure_changes
    );

    Ok(BacktestResult {
        code: series.code().to_string(),
        equity_curve,
        signals,
        exposure_changes,
        stats,
    })
}

/// Runs one backtest per asset in parallel. Results keep the input order and
/// a failure for one asset never affects the others.
pub fn run_backtest_batch(
    series: &[PriceSeries],
    config: &BacktestConfig,
) -> Vec<(String, Result<BacktestResult, QuantError>)> {
    series
        .par_iter()
        .map(|s| (s.code().to_string(), run_backtest(s, config)))
        .collect()
}
