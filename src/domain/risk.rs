//! Return confidence intervals.
//!
//! The interval is a normal approximation: annual returns are assumed to be
//! normally distributed around the expected return with the portfolio's
//! annual volatility as standard deviation. Fat tails are not modelled.

use crate::domain::error::QuantError;
use crate::domain::optimizer::OptimizationResult;
use statrs::distribution::{ContinuousCDF, Normal};

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
    pub z: f64,
}

impl ConfidenceInterval {
    pub fn from_optimization(
        result: &OptimizationResult,
        confidence: f64,
    ) -> Result<Self, QuantError> {
        project_return_interval(result.expected_return, result.volatility, confidence)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// Two-sided interval `r ∓ z·v` with `z = Φ⁻¹(1 − (1 − c)/2)`.
pub fn project_return_interval(
    expected_return: f64,
    volatility: f64,
    confidence: f64,
) -> Result<ConfidenceInterval, QuantError> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(QuantError::invalid(format!(
            "confidence must be in (0, 1), got {}",
            confidence
        )));
    }
    if !(volatility >= 0.0 && volatility.is_finite()) {
        return Err(QuantError::invalid(format!(
            "volatility must be finite and non-negative, got {}",
            volatility
        )));
    }
    if !expected_return.is_finite() {
        return Err(QuantError::invalid("expected return must be finite"));
    }

    let standard =
        Normal::new(0.0, 1.0).map_err(|e| QuantError::invalid(format!("normal: {}", e)))?;
    let z = standard.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);

    Ok(ConfidenceInterval {
        lower: expected_return - z * volatility,
        upper: expected_return + z * volatility,
        confidence,
        z,
    })
}
