//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest_batch, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_weights, read_date, read_f64, read_i32, read_usize, require_string, validate_all,
    validate_backtest_config, validate_contribution_config, validate_data_range,
    validate_indicator_config, validate_optimizer_config, validate_risk_config,
    validate_scoring_config,
};
use crate::domain::contribution::{suggest_contributions, ContributionSuggestion};
use crate::domain::error::QuantError;
use crate::domain::indicator::{calculate_rsi, calculate_sma};
use crate::domain::macro_outlook::country_for_code;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::optimizer::{
    optimize_universe, regularized_retry, Objective, OptimizationResult, OptimizerConfig,
};
use crate::domain::recommendation::{
    investable_codes, recommend_batch, AssetSignals, IndicatorSnapshot, RecommendationRecord,
    ScoringConfig,
};
use crate::domain::risk::{ConfidenceInterval, DEFAULT_CONFIDENCE};
use crate::domain::universe::{align_universe, load_universe, parse_codes, SkippedCode};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "quantfolio",
    about = "Equity indicators, backtests, portfolio optimization and recommendations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the latest SMA and RSI values per asset
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated codes, replacing [data] codes
        #[arg(long)]
        code: Option<String>,
    },
    /// Backtest the SMA crossover strategy per asset
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Optimize portfolio weights over the configured universe
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        /// max_sharpe or min_volatility
        #[arg(long)]
        objective: Option<String>,
        /// Optimize only the codes recommended as Buy or Hold/Neutral
        #[arg(long)]
        from_recommendations: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score each asset and print a recommendation
    Recommend {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the codes available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Indicators { config, code } => run_indicators(&config, code.as_deref()),
        Command::Backtest {
            config,
            code,
            output,
        } => run_backtest(&config, code.as_deref(), output.as_deref()),
        Command::Optimize {
            config,
            code,
            objective,
            from_recommendations,
            output,
        } => run_optimize(
            &config,
            code.as_deref(),
            objective.as_deref(),
            from_recommendations,
            output.as_deref(),
        ),
        Command::Recommend {
            config,
            code,
            output,
        } => run_recommend(&config, code.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, QuantError> {
    log::info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Where to read prices from, which codes, and over which dates.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub directory: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorWindows {
    pub short: usize,
    pub long: usize,
    pub rsi: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRequest {
    pub current_value: f64,
    pub amount: f64,
    pub current_weights: BTreeMap<String, f64>,
}

pub fn build_data_request(
    config: &dyn ConfigPort,
    code_override: Option<&str>,
) -> Result<DataRequest, QuantError> {
    validate_data_range(config)?;
    let directory = PathBuf::from(require_string(config, "data", "directory")?);
    let start_date = read_date(config, "data", "start_date")?;
    let end_date = read_date(config, "data", "end_date")?;
    let codes = resolve_codes(code_override, config)?;
    Ok(DataRequest {
        directory,
        start_date,
        end_date,
        codes,
    })
}

pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, QuantError> {
    let (raw, key) = match code_override {
        Some(c) => (c.to_string(), "--code"),
        None => (require_string(config, "data", "codes")?, "codes"),
    };
    parse_codes(&raw).map_err(|e| QuantError::ConfigInvalid {
        section: "data".to_string(),
        key: key.to_string(),
        reason: e.to_string(),
    })
}

pub fn build_indicator_windows(config: &dyn ConfigPort) -> Result<IndicatorWindows, QuantError> {
    validate_indicator_config(config)?;
    Ok(IndicatorWindows {
        short: read_usize(config, "indicators", "short_window", 50)?,
        long: read_usize(config, "indicators", "long_window", 200)?,
        rsi: read_usize(config, "indicators", "rsi_window", 14)?,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, QuantError> {
    validate_backtest_config(config)?;
    let windows = build_indicator_windows(config)?;
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        short_window: windows.short,
        long_window: windows.long,
        periods_per_year: read_f64(
            config,
            "backtest",
            "periods_per_year",
            defaults.periods_per_year,
        )?,
        risk_free_rate: read_f64(config, "backtest", "risk_free_rate", defaults.risk_free_rate)?,
    })
}

pub fn build_optimizer_config(
    config: &dyn ConfigPort,
    objective_override: Option<&str>,
) -> Result<OptimizerConfig, QuantError> {
    validate_optimizer_config(config)?;
    validate_backtest_config(config)?;
    let defaults = OptimizerConfig::default();

    let objective = match objective_override {
        Some(raw) => raw.parse::<Objective>()?,
        None => match config.get_string("optimizer", "objective") {
            Some(raw) => raw.parse::<Objective>()?,
            None => defaults.objective,
        },
    };

    Ok(OptimizerConfig {
        objective,
        l2_gamma: read_f64(config, "optimizer", "l2_gamma", defaults.l2_gamma)?,
        weight_cutoff: read_f64(config, "optimizer", "weight_cutoff", defaults.weight_cutoff)?,
        max_iterations: read_usize(
            config,
            "optimizer",
            "max_iterations",
            defaults.max_iterations,
        )?,
        tolerance: read_f64(config, "optimizer", "tolerance", defaults.tolerance)?,
        risk_free_rate: read_f64(config, "backtest", "risk_free_rate", defaults.risk_free_rate)?,
        periods_per_year: read_f64(
            config,
            "backtest",
            "periods_per_year",
            defaults.periods_per_year,
        )?,
        min_rows: read_usize(config, "optimizer", "min_rows", defaults.min_rows)?,
    })
}

/// `--from-recommendations` or `[optimizer] universe = recommended`.
pub fn uses_recommended_universe(
    flag: bool,
    config: &dyn ConfigPort,
) -> Result<bool, QuantError> {
    if flag {
        return Ok(true);
    }
    validate_optimizer_config(config)?;
    Ok(config
        .get_string("optimizer", "universe")
        .is_some_and(|raw| raw.trim().eq_ignore_ascii_case("recommended")))
}

pub fn build_confidence(config: &dyn ConfigPort) -> Result<f64, QuantError> {
    validate_risk_config(config)?;
    read_f64(config, "risk", "confidence", DEFAULT_CONFIDENCE)
}

pub fn build_scoring_config(config: &dyn ConfigPort) -> Result<ScoringConfig, QuantError> {
    validate_scoring_config(config)?;
    let defaults = ScoringConfig::default();
    Ok(ScoringConfig {
        oversold: read_f64(config, "scoring", "oversold", defaults.oversold)?,
        overbought: read_f64(config, "scoring", "overbought", defaults.overbought)?,
        buy_threshold: read_i32(config, "scoring", "buy_threshold", defaults.buy_threshold)?,
        sell_threshold: read_i32(config, "scoring", "sell_threshold", defaults.sell_threshold)?,
    })
}

/// `None` unless `[contribution] amount` is set.
pub fn build_contribution_request(
    config: &dyn ConfigPort,
) -> Result<Option<ContributionRequest>, QuantError> {
    if config.get_string("contribution", "amount").is_none() {
        return Ok(None);
    }
    validate_contribution_config(config)?;
    let current_weights = match config.get_string("contribution", "current_weights") {
        Some(raw) => parse_weights(&raw).map_err(|reason| QuantError::ConfigInvalid {
            section: "contribution".to_string(),
            key: "current_weights".to_string(),
            reason,
        })?,
        None => BTreeMap::new(),
    };
    Ok(Some(ContributionRequest {
        current_value: read_f64(config, "contribution", "current_value", 0.0)?,
        amount: read_f64(config, "contribution", "amount", 0.0)?,
        current_weights,
    }))
}

/// `--output` wins over `[output] directory`; `None` means print only.
pub fn resolve_output_dir(
    output_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Option<PathBuf> {
    output_override.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("output", "directory")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
}

fn log_skipped(skipped: &[SkippedCode]) {
    if !skipped.is_empty() {
        log::warn!("{} codes skipped", skipped.len());
    }
}

// ---------------------------------------------------------------------------
// indicators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSummary {
    pub code: String,
    pub bars: usize,
    pub last_close: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
}

pub fn indicator_pipeline(
    data_port: &dyn MarketDataPort,
    request: &DataRequest,
    windows: &IndicatorWindows,
) -> Result<Vec<(String, Result<IndicatorSummary, QuantError>)>, QuantError> {
    let loaded = load_universe(data_port, &request.codes, request.start_date, request.end_date)?;
    log_skipped(&loaded.skipped);

    let summaries = loaded
        .series
        .par_iter()
        .map(|series| (series.code().to_string(), summarize(series, windows)))
        .collect();

    Ok(summaries)
}

fn summarize(
    series: &PriceSeries,
    windows: &IndicatorWindows,
) -> Result<IndicatorSummary, QuantError> {
    Ok(IndicatorSummary {
        code: series.code().to_string(),
        bars: series.len(),
        last_close: series.bars().last().map(|b| b.adj_close),
        sma_short: calculate_sma(series, windows.short)?.latest(),
        sma_long: calculate_sma(series, windows.long)?.latest(),
        rsi: calculate_rsi(series, windows.rsi)?.latest(),
    })
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn run_indicators(config_path: &Path, code_override: Option<&str>) -> Result<(), QuantError> {
    // Stage 1: Load config
    let config = load_config(config_path)?;
    let request = build_data_request(&config, code_override)?;
    let windows = build_indicator_windows(&config)?;

    // Stage 2: Load data and compute
    log::info!("Loading {} codes from {}", request.codes.len(), request.directory.display());
    let data_port = CsvAdapter::new(request.directory.clone());
    let summaries = indicator_pipeline(&data_port, &request, &windows)?;

    // Stage 3: Print
    println!(
        "{:<12} {:>6} {:>10} {:>10} {:>10} {:>8}",
        "code",
        "bars",
        "close",
        format!("SMA({})", windows.short),
        format!("SMA({})", windows.long),
        format!("RSI({})", windows.rsi),
    );
    for (code, summary) in &summaries {
        match summary {
            Ok(s) => println!(
                "{:<12} {:>6} {:>10} {:>10} {:>10} {:>8}",
                s.code,
                s.bars,
                fmt_opt(s.last_close),
                fmt_opt(s.sma_short),
                fmt_opt(s.sma_long),
                fmt_opt(s.rsi),
            ),
            Err(e) => log::warn!("{}: {}", code, e),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// backtest
// ---------------------------------------------------------------------------

pub struct BacktestRun {
    pub results: Vec<(String, Result<BacktestResult, QuantError>)>,
    pub skipped: Vec<SkippedCode>,
}

impl BacktestRun {
    pub fn successes(&self) -> Vec<BacktestResult> {
        self.results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok().cloned())
            .collect()
    }
}

pub fn backtest_pipeline(
    data_port: &dyn MarketDataPort,
    request: &DataRequest,
    config: &BacktestConfig,
) -> Result<BacktestRun, QuantError> {
    let loaded = load_universe(data_port, &request.codes, request.start_date, request.end_date)?;
    log::info!(
        "Running SMA({})/SMA({}) backtest on {} codes",
        config.short_window,
        config.long_window,
        loaded.series.len()
    );
    let results = run_backtest_batch(&loaded.series, config);
    Ok(BacktestRun {
        results,
        skipped: loaded.skipped,
    })
}

fn run_backtest(
    config_path: &Path,
    code_override: Option<&str>,
    output_override: Option<&Path>,
) -> Result<(), QuantError> {
    // Stage 1: Load config
    let config = load_config(config_path)?;
    let request = build_data_request(&config, code_override)?;
    let bt_config = build_backtest_config(&config)?;
    let output_dir = resolve_output_dir(output_override, &config);

    // Stage 2: Run
    let data_port = CsvAdapter::new(request.directory.clone());
    let run = backtest_pipeline(&data_port, &request, &bt_config)?;
    log_skipped(&run.skipped);

    // Stage 3: Print summary
    println!("\n=== Backtest Results ===");
    for (code, result) in &run.results {
        match result {
            Ok(r) => println!(
                "  {:<12} total {:>8.2}%  annual {:>7.2}%  vol {:>6.2}%  \
                 sharpe {:>6}  maxDD {:>7.2}%  changes {}",
                code,
                r.stats.total_return * 100.0,
                r.stats.annualized_return * 100.0,
                r.stats.annualized_volatility * 100.0,
                fmt_opt(r.stats.sharpe_ratio),
                r.stats.max_drawdown * 100.0,
                r.exposure_changes,
            ),
            Err(e) => {
                println!("  {:<12} failed: {}", code, e);
                if e.is_per_asset() {
                    log::warn!("{}: {}", code, e);
                } else {
                    log::error!("{}: {}", code, e);
                }
            }
        }
    }

    let successes = run.successes();
    if successes.is_empty() {
        // every per-asset run failed; surface the first cause
        if let Some((_, Err(e))) = run.results.into_iter().find(|(_, r)| r.is_err()) {
            return Err(e);
        }
        return Err(QuantError::NoData {
            code: request.codes.join(","),
        });
    }

    // Stage 4: Write reports
    if let Some(dir) = output_dir {
        let paths = CsvReportAdapter::new().write_backtest(&successes, &dir)?;
        log::info!("Wrote {} report files to {}", paths.len(), dir.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// optimize
// ---------------------------------------------------------------------------

pub struct PortfolioRun {
    pub result: OptimizationResult,
    pub interval: ConfidenceInterval,
    pub aligned_rows: usize,
    pub skipped: Vec<SkippedCode>,
    pub contributions: Option<Vec<ContributionSuggestion>>,
}

/// Loads and aligns the universe, then optimizes. A failed MaxSharpe solve
/// is retried once with ten times the L2 regularization when the solver
/// itself gave up.
pub fn optimize_pipeline(
    data_port: &dyn MarketDataPort,
    request: &DataRequest,
    config: &OptimizerConfig,
    confidence: f64,
    contribution: Option<&ContributionRequest>,
) -> Result<PortfolioRun, QuantError> {
    let loaded = load_universe(data_port, &request.codes, request.start_date, request.end_date)?;
    let universe = align_universe(&loaded.series, config.min_rows)?;
    log::info!(
        "Aligned {} assets over {} rows ({} to {})",
        universe.asset_count(),
        universe.row_count(),
        universe.dates().first().map(|d| d.to_string()).unwrap_or_default(),
        universe.dates().last().map(|d| d.to_string()).unwrap_or_default(),
    );

    let result = match optimize_universe(&universe, config) {
        Ok(r) => r,
        Err(e) => match regularized_retry(config, &e) {
            Some(retry) => {
                log::warn!("{}; retrying with l2_gamma = {}", e, retry.l2_gamma);
                optimize_universe(&universe, &retry)?
            }
            None => return Err(e),
        },
    };

    let interval = ConfidenceInterval::from_optimization(&result, confidence)?;

    let contributions = match contribution {
        Some(c) => Some(suggest_contributions(
            c.current_value,
            &c.current_weights,
            &result.weights,
            c.amount,
        )?),
        None => None,
    };

    Ok(PortfolioRun {
        result,
        interval,
        aligned_rows: universe.row_count(),
        skipped: loaded.skipped,
        contributions,
    })
}

/// Scores every requested code and keeps the Buy and Hold/Neutral ones.
/// Fails when fewer than two codes survive.
pub fn recommended_request(
    data_port: &dyn MarketDataPort,
    request: &DataRequest,
    rsi_window: usize,
    scoring: &ScoringConfig,
) -> Result<(DataRequest, Vec<RecommendationRecord>), QuantError> {
    let records = recommend_pipeline(data_port, request, rsi_window, scoring);
    let codes = investable_codes(&records);
    for record in records.iter().filter(|r| !codes.contains(&r.code)) {
        log::info!("excluding {} ({})", record.code, record.label);
    }
    if codes.len() < 2 {
        return Err(QuantError::InsufficientData {
            code: "recommended universe".to_string(),
            rows: codes.len(),
            minimum: 2,
        });
    }
    let narrowed = DataRequest {
        codes,
        ..request.clone()
    };
    Ok((narrowed, records))
}

fn run_optimize(
    config_path: &Path,
    code_override: Option<&str>,
    objective_override: Option<&str>,
    from_recommendations: bool,
    output_override: Option<&Path>,
) -> Result<(), QuantError> {
    // Stage 1: Load config
    let config = load_config(config_path)?;
    let mut request = build_data_request(&config, code_override)?;
    let opt_config = build_optimizer_config(&config, objective_override)?;
    let recommended = uses_recommended_universe(from_recommendations, &config)?;
    let confidence = build_confidence(&config)?;
    let contribution = build_contribution_request(&config)?;
    let output_dir = resolve_output_dir(output_override, &config);

    let data_port = CsvAdapter::new(request.directory.clone());

    // Stage 2: Narrow to recommended codes
    if recommended {
        let windows = build_indicator_windows(&config)?;
        let scoring = build_scoring_config(&config)?;
        let (narrowed, _) = recommended_request(&data_port, &request, windows.rsi, &scoring)?;
        log::info!(
            "{} of {} codes recommended: {}",
            narrowed.codes.len(),
            request.codes.len(),
            narrowed.codes.join(",")
        );
        request = narrowed;
    }

    // Stage 3: Optimize
    log::info!("Optimizing {} ({} codes)", opt_config.objective, request.codes.len());
    let run = optimize_pipeline(
        &data_port,
        &request,
        &opt_config,
        confidence,
        contribution.as_ref(),
    )?;
    log_skipped(&run.skipped);

    // Stage 4: Print summary
    let r = &run.result;
    println!("\n=== Optimal Portfolio ({}) ===", r.objective);
    for (code, weight) in &r.weights {
        println!("  {:<12} {:>7.2}%", code, weight * 100.0);
    }
    println!("Expected return:  {:.2}%", r.expected_return * 100.0);
    println!("Volatility:       {:.2}%", r.volatility * 100.0);
    println!("Sharpe ratio:     {}", fmt_opt(r.sharpe_ratio));
    println!(
        "{:.0}% interval:     [{:.2}%, {:.2}%] (normal approximation)",
        run.interval.confidence * 100.0,
        run.interval.lower * 100.0,
        run.interval.upper * 100.0,
    );

    if let Some(suggestions) = &run.contributions {
        println!("\n=== Suggested Contributions ===");
        for s in suggestions {
            println!(
                "  {:<12} {:>12.2} (target {:.2}, current {:.2})",
                s.code, s.contribution, s.target_value, s.current_value
            );
        }
    }

    // Stage 5: Write reports
    if let Some(dir) = output_dir {
        let report = CsvReportAdapter::new();
        let mut paths = report.write_optimization(&run.result, Some(&run.interval), &dir)?;
        if let Some(suggestions) = &run.contributions {
            paths.extend(report.write_contributions(suggestions, &dir)?);
        }
        log::info!("Wrote {} report files to {}", paths.len(), dir.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// recommend
// ---------------------------------------------------------------------------

/// Gathers each asset's signals. Per-asset failures degrade that asset's
/// inputs; they never abort the batch.
pub fn collect_signals(
    data_port: &dyn MarketDataPort,
    request: &DataRequest,
    rsi_window: usize,
) -> Vec<AssetSignals> {
    request
        .codes
        .iter()
        .map(|code| {
            let mut signals = AssetSignals::new(code.clone());

            match data_port.fetch_prices(code, request.start_date, request.end_date) {
                Ok(series) if !series.is_empty() => match calculate_rsi(&series, rsi_window) {
                    Ok(rsi) => signals.indicators = Some(IndicatorSnapshot::from_series(&rsi)),
                    Err(e) => log::warn!("{}: RSI failed ({})", code, e),
                },
                Ok(_) => log::warn!("{}: no bars in range", code),
                Err(e) => log::warn!("{}: prices unavailable ({})", code, e),
            }

            let fundamentals = match data_port.fetch_fundamentals(code) {
                Ok(f) => Some(f),
                Err(e) => {
                    log::debug!("{}: {}", code, e);
                    None
                }
            };
            signals.rating = fundamentals.as_ref().and_then(|f| f.rating());

            let country = fundamentals
                .as_ref()
                .and_then(|f| f.country.clone())
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| country_for_code(code).to_string());
            signals.macro_outlook = match data_port.fetch_macro_outlook(&country) {
                Ok(outlook) => Some(outlook),
                Err(e) => {
                    log::debug!("{}: {}", code, e);
                    None
                }
            };
            signals.country = Some(country);
            signals.fundamentals = fundamentals;

            signals
        })
        .collect()
}

pub fn recommend_pipeline(
    data_port: &dyn MarketDataPort,
    request: &DataRequest,
    rsi_window: usize,
    scoring: &ScoringConfig,
) -> Vec<RecommendationRecord> {
    let signals = collect_signals(data_port, request, rsi_window);
    recommend_batch(&signals, scoring)
}

fn run_recommend(
    config_path: &Path,
    code_override: Option<&str>,
    output_override: Option<&Path>,
) -> Result<(), QuantError> {
    // Stage 1: Load config
    let config = load_config(config_path)?;
    let request = build_data_request(&config, code_override)?;
    let windows = build_indicator_windows(&config)?;
    let scoring = build_scoring_config(&config)?;
    let output_dir = resolve_output_dir(output_override, &config);

    // Stage 2: Score
    let data_port = CsvAdapter::new(request.directory.clone());
    let records = recommend_pipeline(&data_port, &request, windows.rsi, &scoring);

    // Stage 3: Print
    println!("\n=== Recommendations ===");
    for record in &records {
        println!("{} ({}): score {}", record.code, record.label, record.score);
        for reason in &record.justifications {
            println!("  - {}", reason);
        }
        let metrics = record
            .fundamentals
            .as_ref()
            .map(|f| f.metrics())
            .unwrap_or_default();
        if !metrics.is_empty() {
            println!("  fundamentals: {}", metrics.join(", "));
        }
    }
    let investable = investable_codes(&records);
    println!("\nInvestable ({}): {}", investable.len(), investable.join(", "));

    // Stage 4: Write reports
    if let Some(dir) = output_dir {
        let paths = CsvReportAdapter::new().write_recommendations(&records, &dir)?;
        log::info!("Wrote {} report files to {}", paths.len(), dir.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate / list-symbols
// ---------------------------------------------------------------------------

fn run_validate(config_path: &Path) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    validate_all(&config)?;

    let request = build_data_request(&config, None)?;
    let windows = build_indicator_windows(&config)?;
    let opt_config = build_optimizer_config(&config, None)?;
    println!("Configuration OK");
    println!("  data:       {} ({} codes)", request.directory.display(), request.codes.len());
    println!("  period:     {} to {}", request.start_date, request.end_date);
    println!(
        "  indicators: SMA({}) / SMA({}), RSI({})",
        windows.short, windows.long, windows.rsi
    );
    println!("  optimizer:  {}", opt_config.objective);
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let directory = require_string(&config, "data", "directory")?;
    let symbols = CsvAdapter::new(PathBuf::from(directory)).list_symbols()?;

    if symbols.is_empty() {
        log::warn!("No symbols found");
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    log::info!("{} symbols found", symbols.len());
    Ok(())
}
