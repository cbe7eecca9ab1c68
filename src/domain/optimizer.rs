//! Mean-variance portfolio optimizer.
//!
//! Both objectives are solved over the long-only simplex
//! `{w : sum(w) = 1, w >= 0}` by projected gradient descent with a
//! backtracking step size:
//! - MinVolatility minimizes `w' Σ w`.
//! - MaxSharpe minimizes `-(μ'w - rf) / sqrt(w' Σ w) + γ ||w||²`, the L2
//!   term discouraging allocations concentrated in one asset.
//!
//! The solver is bounded by `max_iterations` and reports
//! `QuantError::Optimization` rather than returning a partial result.

use crate::domain::error::QuantError;
use crate::domain::estimates::{cholesky, dot, mat_vec, ReturnEstimates};
use crate::domain::metrics::TRADING_DAYS_PER_YEAR;
use crate::domain::universe::{AssetUniverse, MIN_ALIGNED_ROWS};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    MaxSharpe,
    MinVolatility,
}

impl FromStr for Objective {
    type Err = QuantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "max_sharpe" => Ok(Objective::MaxSharpe),
            "min_volatility" | "min_vol" => Ok(Objective::MinVolatility),
            other => Err(QuantError::invalid(format!(
                "unknown objective '{}' (expected max_sharpe or min_volatility)",
                other
            ))),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::MaxSharpe => write!(f, "max_sharpe"),
            Objective::MinVolatility => write!(f, "min_volatility"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub objective: Objective,
    /// L2 regularization strength, MaxSharpe only.
    pub l2_gamma: f64,
    /// Weights below this are zeroed before renormalizing.
    pub weight_cutoff: f64,
    pub max_iterations: usize,
    /// Converged once no weight moves by more than this in one step.
    pub tolerance: f64,
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
    pub min_rows: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            objective: Objective::MaxSharpe,
            l2_gamma: 0.1,
            weight_cutoff: 1e-4,
            max_iterations: 20_000,
            tolerance: 1e-10,
            risk_free_rate: 0.0,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            min_rows: MIN_ALIGNED_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub objective: Objective,
    /// (code, weight) in universe order. Weights sum to 1 and are >= 0.
    pub weights: Vec<(String, f64)>,
    pub expected_return: f64,
    pub volatility: f64,
    /// `None` when the optimal portfolio has zero volatility.
    pub sharpe_ratio: Option<f64>,
    pub iterations: usize,
}

impl OptimizationResult {
    pub fn weight(&self, code: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(c, _)| c == code)
            .map(|&(_, w)| w)
    }
}

/// Estimates μ and Σ from an aligned universe, then optimizes.
pub fn optimize_universe(
    universe: &AssetUniverse,
    config: &OptimizerConfig,
) -> Result<OptimizationResult, QuantError> {
    if universe.row_count() < config.min_rows {
        return Err(QuantError::InsufficientData {
            code: "universe".to_string(),
            rows: universe.row_count(),
            minimum: config.min_rows,
        });
    }
    let estimates = ReturnEstimates::from_universe(universe, config.periods_per_year)?;
    optimize(&estimates, config)
}

pub fn optimize(
    estimates: &ReturnEstimates,
    config: &OptimizerConfig,
) -> Result<OptimizationResult, QuantError> {
    validate_config(config)?;
    let n = estimates.codes.len();
    if n < 2 {
        return Err(QuantError::invalid("optimization needs at least 2 assets"));
    }
    if estimates.expected_returns.len() != n || estimates.covariance.len() != n {
        return Err(QuantError::invalid("estimates do not match the asset list"));
    }

    cholesky(&estimates.covariance)?;

    let problem = Problem {
        mu: &estimates.expected_returns,
        sigma: &estimates.covariance,
        rf: config.risk_free_rate,
        gamma: config.l2_gamma,
        objective: config.objective,
    };

    if config.objective == Objective::MaxSharpe && !problem.mu.iter().any(|&m| m > problem.rf) {
        return Err(QuantError::optimization(
            "at least one asset must have an expected return above the risk-free rate",
        ));
    }

    let (raw, iterations) = solve(&problem, config)?;
    let weights = clean_weights(&raw, config.weight_cutoff)?;

    let expected_return = estimates.portfolio_return(&weights);
    let volatility = estimates.portfolio_variance(&weights).max(0.0).sqrt();
    let sharpe_ratio = if volatility > 0.0 {
        Some((expected_return - config.risk_free_rate) / volatility)
    } else {
        None
    };

    log::debug!(
        "{} converged in {} iterations: return {:.4}, volatility {:.4}",
        config.objective,
        iterations,
        expected_return,
        volatility
    );

    Ok(OptimizationResult {
        objective: config.objective,
        weights: estimates.codes.iter().cloned().zip(weights).collect(),
        expected_return,
        volatility,
        sharpe_ratio,
        iterations,
    })
}

fn validate_config(config: &OptimizerConfig) -> Result<(), QuantError> {
    if !(config.l2_gamma >= 0.0 && config.l2_gamma.is_finite()) {
        return Err(QuantError::invalid("l2_gamma must be a non-negative number"));
    }
    if !(0.0..1.0).contains(&config.weight_cutoff) {
        return Err(QuantError::invalid("weight_cutoff must be in [0, 1)"));
    }
    if config.max_iterations == 0 {
        return Err(QuantError::invalid("max_iterations must be >= 1"));
    }
    if !(config.tolerance > 0.0) {
        return Err(QuantError::invalid("tolerance must be positive"));
    }
    Ok(())
}

struct Problem<'a> {
    mu: &'a [f64],
    sigma: &'a [Vec<f64>],
    rf: f64,
    gamma: f64,
    objective: Objective,
}

impl Problem<'_> {
    fn value(&self, w: &[f64]) -> f64 {
        let variance = dot(w, &mat_vec(self.sigma, w));
        match self.objective {
            Objective::MinVolatility => variance,
            Objective::MaxSharpe => {
                let excess = dot(self.mu, w) - self.rf;
                -excess / variance.sqrt() + self.gamma * dot(w, w)
            }
        }
    }

    fn gradient(&self, w: &[f64]) -> Vec<f64> {
        let sigma_w = mat_vec(self.sigma, w);
        match self.objective {
            Objective::MinVolatility => sigma_w.iter().map(|x| 2.0 * x).collect(),
            Objective::MaxSharpe => {
                let variance = dot(w, &sigma_w);
                let vol = variance.sqrt();
                let excess = dot(self.mu, w) - self.rf;
                self.mu
                    .iter()
                    .zip(&sigma_w)
                    .zip(w)
                    .map(|((m, sw), wi)| {
                        -m / vol + excess * sw / (variance * vol) + 2.0 * self.gamma * wi
                    })
                    .collect()
            }
        }
    }
}

const MIN_STEP: f64 = 1e-20;

fn solve(
    problem: &Problem<'_>,
    config: &OptimizerConfig,
) -> Result<(Vec<f64>, usize), QuantError> {
    let n = problem.mu.len();
    let mut w = vec![1.0 / n as f64; n];
    let mut fw = problem.value(&w);
    let mut step = 1.0;

    for iteration in 1..=config.max_iterations {
        let grad = problem.gradient(&w);
        if !fw.is_finite() || grad.iter().any(|g| !g.is_finite()) {
            return Err(QuantError::solver(format!(
                "non-finite objective at iteration {}",
                iteration
            )));
        }

        // backtracking on the projected step (sufficient-decrease test).
        // A move below tolerance is accepted as is: at that scale the test
        // is decided by rounding.
        let (candidate, f_candidate, change) = loop {
            let trial: Vec<f64> = w.iter().zip(&grad).map(|(wi, gi)| wi - step * gi).collect();
            let candidate = project_to_simplex(&trial);
            let diff: Vec<f64> = candidate.iter().zip(&w).map(|(c, wi)| c - wi).collect();
            let change = diff.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
            let f_candidate = problem.value(&candidate);
            let bound = fw + dot(&grad, &diff) + dot(&diff, &diff) / (2.0 * step);
            if f_candidate.is_finite() && (f_candidate <= bound || change < config.tolerance) {
                break (candidate, f_candidate, change);
            }
            step *= 0.5;
            if step < MIN_STEP {
                return Err(QuantError::solver(format!(
                    "line search failed at iteration {}",
                    iteration
                )));
            }
        };

        w = candidate;
        fw = f_candidate;
        if change < config.tolerance {
            return Ok((w, iteration));
        }
        step *= 2.0;
    }

    Err(QuantError::solver(format!(
        "{} did not converge within {} iterations",
        config.objective, config.max_iterations
    )))
}

/// The configuration for a second MaxSharpe attempt after a solver failure:
/// ten times the L2 strength, or 0.1 when it was zero. `None` when the
/// failure is one more regularization cannot fix (singular covariance, no
/// return above the risk-free rate, invalid parameters) or the objective is
/// MinVolatility.
pub fn regularized_retry(config: &OptimizerConfig, err: &QuantError) -> Option<OptimizerConfig> {
    match err {
        QuantError::Optimization { solver: true, .. }
            if config.objective == Objective::MaxSharpe =>
        {
            let l2_gamma = if config.l2_gamma > 0.0 {
                config.l2_gamma * 10.0
            } else {
                0.1
            };
            Some(OptimizerConfig {
                l2_gamma,
                ..config.clone()
            })
        }
        _ => None,
    }
}

/// Euclidean projection onto the probability simplex.
pub fn project_to_simplex(v: &[f64]) -> Vec<f64> {
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumsum = 0.0;
    let mut theta = 0.0;
    for (j, &u) in sorted.iter().enumerate() {
        cumsum += u;
        let t = (cumsum - 1.0) / (j + 1) as f64;
        if u - t > 0.0 {
            theta = t;
        }
    }

    v.iter().map(|x| (x - theta).max(0.0)).collect()
}

/// Zeroes weights below `cutoff` and renormalizes to sum to 1.
pub fn clean_weights(weights: &[f64], cutoff: f64) -> Result<Vec<f64>, QuantError> {
    let kept: Vec<f64> = weights
        .iter()
        .map(|&w| if w < cutoff { 0.0 } else { w })
        .collect();
    let total: f64 = kept.iter().sum();
    if !(total > 0.0) {
        return Err(QuantError::optimization(
            "all weights fell below the cutoff",
        ));
    }
    Ok(kept.iter().map(|w| w / total).collect())
}
