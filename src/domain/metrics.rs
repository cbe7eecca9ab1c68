//! Performance statistics over an equity curve.

use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// `None` when volatility is zero; the ratio is undefined there.
    pub sharpe_ratio: Option<f64>,
    /// Largest peak-to-trough decline as a negative fraction (0.0 if none).
    pub max_drawdown: f64,
    /// Longest run of consecutive periods spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub periods: usize,
}

impl PerformanceStats {
    pub fn from_equity_curve(
        equity_curve: &[EquityPoint],
        periods_per_year: f64,
        risk_free_rate: f64,
    ) -> Self {
        let periods = equity_curve.len();
        let (first, last) = match (equity_curve.first(), equity_curve.last()) {
            (Some(f), Some(l)) => (f.equity, l.equity),
            _ => {
                return PerformanceStats {
                    total_return: 0.0,
                    annualized_return: 0.0,
                    annualized_volatility: 0.0,
                    sharpe_ratio: None,
                    max_drawdown: 0.0,
                    max_drawdown_duration: 0,
                    periods,
                };
            }
        };

        let total_return = if first > 0.0 { last / first - 1.0 } else { 0.0 };

        let annualized_return = if total_return.is_finite() && total_return > -1.0 {
            (1.0 + total_return).powf(periods_per_year / periods as f64) - 1.0
        } else {
            -1.0
        };

        let annualized_volatility = period_stddev(equity_curve) * periods_per_year.sqrt();

        let sharpe_ratio = if annualized_volatility > 0.0 {
            Some((annualized_return - risk_free_rate) / annualized_volatility)
        } else {
            None
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        PerformanceStats {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            periods,
        }
    }
}

pub fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                w[1].equity / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Sample standard deviation (n - 1) of the period returns.
fn period_stddev(equity_curve: &[EquityPoint]) -> f64 {
    let returns = period_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
            continue;
        }
        if peak > 0.0 {
            let dd = point.equity / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
        current_duration += 1;
        max_duration = max_duration.max(current_duration);
    }

    (max_dd, max_duration)
}
