//! CSV report adapter implementing ReportPort.
//!
//! Files written into the output directory:
//! - `backtest_summary.csv` plus one `equity_<CODE>.csv` per asset
//! - `weights_<objective>.csv` and `optimization_<objective>.csv`
//! - `recommendations.csv`
//! - `contributions.csv`

use crate::domain::backtest::BacktestResult;
use crate::domain::contribution::ContributionSuggestion;
use crate::domain::error::QuantError;
use crate::domain::optimizer::OptimizationResult;
use crate::domain::recommendation::RecommendationRecord;
use crate::domain::risk::ConfidenceInterval;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

#[derive(Serialize)]
struct BacktestSummaryRow<'a> {
    code: &'a str,
    periods: usize,
    total_return: f64,
    annualized_return: f64,
    annualized_volatility: f64,
    sharpe_ratio: Option<f64>,
    max_drawdown: f64,
    max_drawdown_duration: usize,
    exposure_changes: usize,
}

#[derive(Serialize)]
struct EquityRow {
    date: String,
    equity: f64,
    weight: f64,
}

#[derive(Serialize)]
struct WeightRow<'a> {
    code: &'a str,
    weight: f64,
}

#[derive(Serialize)]
struct OptimizationRow {
    objective: String,
    expected_return: f64,
    volatility: f64,
    sharpe_ratio: Option<f64>,
    iterations: usize,
    confidence: Option<f64>,
    return_lower: Option<f64>,
    return_upper: Option<f64>,
}

#[derive(Serialize)]
struct RecommendationRow<'a> {
    code: &'a str,
    score: i32,
    label: String,
    justifications: String,
    recommendation_mean: Option<f64>,
    trailing_pe: Option<f64>,
    price_to_book: Option<f64>,
    dividend_yield: Option<f64>,
    return_on_equity: Option<f64>,
    beta: Option<f64>,
}

#[derive(Serialize)]
struct ContributionRow<'a> {
    code: &'a str,
    target_value: f64,
    current_value: f64,
    contribution: f64,
}

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_rows<T: Serialize>(
        output_dir: &Path,
        file_name: &str,
        rows: impl IntoIterator<Item = T>,
    ) -> Result<PathBuf, QuantError> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        log::debug!("wrote {}", path.display());
        Ok(path)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(
        &self,
        results: &[BacktestResult],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError> {
        let summary = results.iter().map(|r| BacktestSummaryRow {
            code: &r.code,
            periods: r.stats.periods,
            total_return: r.stats.total_return,
            annualized_return: r.stats.annualized_return,
            annualized_volatility: r.stats.annualized_volatility,
            sharpe_ratio: r.stats.sharpe_ratio,
            max_drawdown: r.stats.max_drawdown,
            max_drawdown_duration: r.stats.max_drawdown_duration,
            exposure_changes: r.exposure_changes,
        });
        let mut paths = vec![Self::write_rows(output_dir, "backtest_summary.csv", summary)?];

        for result in results {
            let rows = result
                .equity_curve
                .iter()
                .zip(&result.signals)
                .map(|(point, signal)| EquityRow {
                    date: point.date.format("%Y-%m-%d").to_string(),
                    equity: point.equity,
                    weight: signal.weight,
                });
            let file_name = format!("equity_{}.csv", result.code);
            paths.push(Self::write_rows(output_dir, &file_name, rows)?);
        }

        Ok(paths)
    }

    fn write_optimization(
        &self,
        result: &OptimizationResult,
        interval: Option<&ConfidenceInterval>,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError> {
        let weights = result.weights.iter().map(|(code, weight)| WeightRow {
            code,
            weight: *weight,
        });
        let weights_path = Self::write_rows(
            output_dir,
            &format!("weights_{}.csv", result.objective),
            weights,
        )?;

        let summary = OptimizationRow {
            objective: result.objective.to_string(),
            expected_return: result.expected_return,
            volatility: result.volatility,
            sharpe_ratio: result.sharpe_ratio,
            iterations: result.iterations,
            confidence: interval.map(|ci| ci.confidence),
            return_lower: interval.map(|ci| ci.lower),
            return_upper: interval.map(|ci| ci.upper),
        };
        let summary_path = Self::write_rows(
            output_dir,
            &format!("optimization_{}.csv", result.objective),
            [summary],
        )?;

        Ok(vec![weights_path, summary_path])
    }

    fn write_recommendations(
        &self,
        records: &[RecommendationRecord],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError> {
        let rows = records.iter().map(|r| {
            let f = r.fundamentals.as_ref();
            RecommendationRow {
                code: &r.code,
                score: r.score,
                label: r.label.to_string(),
                justifications: r.justifications.join("; "),
                recommendation_mean: f.and_then(|f| f.recommendation_mean),
                trailing_pe: f.and_then(|f| f.trailing_pe),
                price_to_book: f.and_then(|f| f.price_to_book),
                dividend_yield: f.and_then(|f| f.dividend_yield),
                return_on_equity: f.and_then(|f| f.return_on_equity),
                beta: f.and_then(|f| f.beta),
            }
        });
        Ok(vec![Self::write_rows(output_dir, "recommendations.csv", rows)?])
    }

    fn write_contributions(
        &self,
        suggestions: &[ContributionSuggestion],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError> {
        let rows = suggestions.iter().map(|s| ContributionRow {
            code: &s.code,
            target_value: s.target_value,
            current_value: s.current_value,
            contribution: s.contribution,
        });
        Ok(vec![Self::write_rows(output_dir, "contributions.csv", rows)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fundamentals::FundamentalSnapshot;
    use crate::domain::optimizer::Objective;
    use crate::domain::recommendation::Recommendation;
    use tempfile::TempDir;

    #[test]
    fn writes_recommendations_with_joined_justifications() {
        let dir = TempDir::new().unwrap();
        let mut snap = FundamentalSnapshot::new("AAPL");
        snap.trailing_pe = Some(28.5);
        snap.beta = Some(1.2);
        let records = vec![
            RecommendationRecord {
                code: "AAPL".to_string(),
                score: 5,
                label: Recommendation::Buy,
                justifications: vec![
                    "RSI 25.00: oversold (< 30)".to_string(),
                    "analyst rating: Buy".to_string(),
                ],
                fundamentals: Some(snap),
            },
            RecommendationRecord {
                code: "ZZZ".to_string(),
                score: 0,
                label: Recommendation::InsufficientData,
                justifications: vec!["no price history".to_string()],
                fundamentals: None,
            },
        ];

        let paths = CsvReportAdapter::new()
            .write_recommendations(&records, dir.path())
            .unwrap();
        let content = fs::read_to_string(&paths[0]).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some(
                "code,score,label,justifications,recommendation_mean,trailing_pe,\
                 price_to_book,dividend_yield,return_on_equity,beta"
            )
        );
        assert_eq!(
            lines.next(),
            Some("AAPL,5,Buy,RSI 25.00: oversold (< 30); analyst rating: Buy,,28.5,,,,1.2")
        );
        assert_eq!(lines.next(), Some("ZZZ,0,InsufficientData,no price history,,,,,,"));
    }

    #[test]
    fn writes_weights_and_summary() {
        let dir = TempDir::new().unwrap();
        let result = OptimizationResult {
            objective: Objective::MinVolatility,
            weights: vec![("A".to_string(), 0.25), ("B".to_string(), 0.75)],
            expected_return: 0.1,
            volatility: 0.2,
            sharpe_ratio: Some(0.5),
            iterations: 12,
        };

        let paths = CsvReportAdapter::new()
            .write_optimization(&result, None, &dir.path().join("nested"))
            .unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("weights_min_volatility.csv"));

        let weights = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(weights, "code,weight\nA,0.25\nB,0.75\n");

        let summary = fs::read_to_string(&paths[1]).unwrap();
        assert!(summary.ends_with("min_volatility,0.1,0.2,0.5,12,,,\n"));
    }
}
