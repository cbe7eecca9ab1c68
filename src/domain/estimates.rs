//! Annualized expected-return vector and covariance matrix.

use crate::domain::error::QuantError;
use crate::domain::universe::AssetUniverse;

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnEstimates {
    pub codes: Vec<String>,
    /// Mean period return per asset, annualized.
    pub expected_returns: Vec<f64>,
    /// Sample covariance of period returns, annualized.
    pub covariance: Vec<Vec<f64>>,
}

impl ReturnEstimates {
    pub fn from_universe(
        universe: &AssetUniverse,
        periods_per_year: f64,
    ) -> Result<Self, QuantError> {
        let returns = universe.returns();
        Ok(Self {
            codes: universe.codes().to_vec(),
            expected_returns: mean_returns(&returns, periods_per_year)?,
            covariance: sample_covariance(&returns, periods_per_year)?,
        })
    }

    pub fn portfolio_return(&self, weights: &[f64]) -> f64 {
        dot(&self.expected_returns, weights)
    }

    pub fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        quadratic_form(&self.covariance, weights)
    }
}

/// `returns[row][asset]` → per-asset mean × `periods_per_year`.
pub fn mean_returns(returns: &[Vec<f64>], periods_per_year: f64) -> Result<Vec<f64>, QuantError> {
    let n_assets = column_count(returns)?;
    let n = returns.len() as f64;
    let means = (0..n_assets)
        .map(|j| returns.iter().map(|row| row[j]).sum::<f64>() / n * periods_per_year)
        .collect();
    Ok(means)
}

/// Sample covariance (n - 1 denominator) × `periods_per_year`.
pub fn sample_covariance(
    returns: &[Vec<f64>],
    periods_per_year: f64,
) -> Result<Vec<Vec<f64>>, QuantError> {
    let n_assets = column_count(returns)?;
    if returns.len() < 2 {
        return Err(QuantError::InsufficientData {
            code: "covariance".to_string(),
            rows: returns.len(),
            minimum: 2,
        });
    }
    let n = returns.len() as f64;
    let means: Vec<f64> = (0..n_assets)
        .map(|j| returns.iter().map(|row| row[j]).sum::<f64>() / n)
        .collect();

    let mut cov = vec![vec![0.0; n_assets]; n_assets];
    for i in 0..n_assets {
        for j in i..n_assets {
            let s: f64 = returns
                .iter()
                .map(|row| (row[i] - means[i]) * (row[j] - means[j]))
                .sum();
            let value = s / (n - 1.0) * periods_per_year;
            cov[i][j] = value;
            cov[j][i] = value;
        }
    }
    Ok(cov)
}

fn column_count(returns: &[Vec<f64>]) -> Result<usize, QuantError> {
    let first = returns.first().ok_or_else(|| QuantError::InsufficientData {
        code: "returns".to_string(),
        rows: 0,
        minimum: 1,
    })?;
    let width = first.len();
    if returns.iter().any(|row| row.len() != width) {
        return Err(QuantError::invalid("ragged return matrix"));
    }
    if returns.iter().flatten().any(|r| !r.is_finite()) {
        return Err(QuantError::invalid("non-finite period return"));
    }
    Ok(width)
}

/// Cholesky factorization; fails when the matrix is not positive definite.
pub fn cholesky(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, QuantError> {
    let n = matrix.len();
    let scale = (0..n).map(|i| matrix[i][i].abs()).fold(0.0, f64::max);
    let tolerance = scale * 1e-12;
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let s: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let pivot = matrix[i][i] - s;
                if pivot.is_nan() || pivot <= tolerance {
                    return Err(QuantError::optimization(format!(
                        "covariance matrix is singular or not positive definite (pivot {} = {:e})",
                        i, pivot
                    )));
                }
                l[i][j] = pivot.sqrt();
            } else {
                l[i][j] = (matrix[i][j] - s) / l[j][j];
            }
        }
    }
    Ok(l)
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn mat_vec(matrix: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| dot(row, v)).collect()
}

pub(crate) fn quadratic_form(matrix: &[Vec<f64>], v: &[f64]) -> f64 {
    dot(v, &mat_vec(matrix, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_returns_are_annualized() {
        let returns = vec![vec![0.01, -0.02], vec![0.03, 0.00]];
        let mu = mean_returns(&returns, 252.0).unwrap();
        assert_relative_eq!(mu[0], 0.02 * 252.0, epsilon = 1e-12);
        assert_relative_eq!(mu[1], -0.01 * 252.0, epsilon = 1e-12);
    }

    #[test]
    fn covariance_uses_sample_denominator() {
        let returns = vec![vec![0.01, 0.02], vec![0.03, 0.00], vec![0.02, 0.01]];
        let cov = sample_covariance(&returns, 1.0).unwrap();
        // asset 0: mean 0.02, deviations -0.01, 0.01, 0 → var = 0.0002 / 2
        assert_relative_eq!(cov[0][0], 0.0001, epsilon = 1e-15);
        // deviations asset 1: 0.01, -0.01, 0 → cov = (-0.0001 - 0.0001) / 2
        assert_relative_eq!(cov[0][1], -0.0001, epsilon = 1e-15);
        assert_eq!(cov[0][1], cov[1][0]);
    }

    #[test]
    fn covariance_needs_two_rows() {
        let result = sample_covariance(&[vec![0.01, 0.02]], 252.0);
        assert!(matches!(result, Err(QuantError::InsufficientData { .. })));
    }

    #[test]
    fn empty_returns_fail() {
        assert!(mean_returns(&[], 252.0).is_err());
    }

    #[test]
    fn cholesky_of_positive_definite() {
        let m = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let l = cholesky(&m).unwrap();
        assert_relative_eq!(l[0][0], 2.0);
        assert_relative_eq!(l[1][0], 1.0);
        assert_relative_eq!(l[1][1], 2.0_f64.sqrt());
    }

    #[test]
    fn cholesky_rejects_singular() {
        let m = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        assert!(matches!(cholesky(&m), Err(QuantError::Optimization { .. })));
    }

    #[test]
    fn cholesky_rejects_zero_variance_asset() {
        let m = vec![vec![0.04, 0.0], vec![0.0, 0.0]];
        assert!(cholesky(&m).is_err());
    }

    #[test]
    fn quadratic_form_matches_manual() {
        let m = vec![vec![0.04, 0.01], vec![0.01, 0.09]];
        let w = [0.5, 0.5];
        let expected = 0.25 * 0.04 + 2.0 * 0.25 * 0.01 + 0.25 * 0.09;
        assert_relative_eq!(quadratic_form(&m, &w), expected, epsilon = 1e-15);
    }
}
