//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::contribution::ContributionSuggestion;
use crate::domain::error::QuantError;
use crate::domain::optimizer::OptimizationResult;
use crate::domain::recommendation::RecommendationRecord;
use crate::domain::risk::ConfidenceInterval;
use std::path::{Path, PathBuf};

/// Port for persisting pipeline results. Each method returns the paths it wrote.
pub trait ReportPort {
    fn write_backtest(
        &self,
        results: &[BacktestResult],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError>;

    fn write_optimization(
        &self,
        result: &OptimizationResult,
        interval: Option<&ConfidenceInterval>,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError>;

    fn write_recommendations(
        &self,
        records: &[RecommendationRecord],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError>;

    /// Default: nothing written.
    fn write_contributions(
        &self,
        suggestions: &[ContributionSuggestion],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, QuantError> {
        let _ = (suggestions, output_dir);
        Ok(Vec::new())
    }
}
