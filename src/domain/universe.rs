//! Asset universe: code lists, loading, and date alignment.
//!
//! Alignment outer-joins every asset's dates into one timeline, forward-fills
//! each asset's adjusted close across dates it did not trade, then drops the
//! rows that still have a gap (typically the leading rows before an asset's
//! first observation).

use crate::domain::error::QuantError;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Minimum aligned rows for a usable covariance estimate.
pub const MIN_ALIGNED_ROWS: usize = 30;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Prices for two or more assets on one common, gap-free date index.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUniverse {
    codes: Vec<String>,
    dates: Vec<NaiveDate>,
    /// prices[row][asset]
    prices: Vec<Vec<f64>>,
}

impl AssetUniverse {
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[Vec<f64>] {
        &self.prices
    }

    pub fn asset_count(&self) -> usize {
        self.codes.len()
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    /// Simple period returns, one row per consecutive pair of price rows.
    pub fn returns(&self) -> Vec<Vec<f64>> {
        self.prices
            .windows(2)
            .map(|w| {
                w[0].iter()
                    .zip(&w[1])
                    .map(|(prev, curr)| curr / prev - 1.0)
                    .collect()
            })
            .collect()
    }
}

pub fn build_unified_timeline(series: &[PriceSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.bars().iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}

pub fn align_universe(
    series: &[PriceSeries],
    min_rows: usize,
) -> Result<AssetUniverse, QuantError> {
    if series.len() < 2 {
        return Err(QuantError::InsufficientData {
            code: "universe".to_string(),
            rows: series.len(),
            minimum: 2,
        });
    }

    let timeline = build_unified_timeline(series);

    // columns[asset][row], forward-filled, None before first observation
    let columns: Vec<Vec<Option<f64>>> = series
        .iter()
        .map(|s| {
            let by_date: HashMap<NaiveDate, f64> =
                s.bars().iter().map(|b| (b.date, b.adj_close)).collect();
            let mut last = None;
            timeline
                .iter()
                .map(|date| {
                    if let Some(&price) = by_date.get(date) {
                        last = Some(price);
                    }
                    last
                })
                .collect()
        })
        .collect();

    let mut dates = Vec::with_capacity(timeline.len());
    let mut prices = Vec::with_capacity(timeline.len());
    for (row, date) in timeline.iter().enumerate() {
        let values: Option<Vec<f64>> = columns.iter().map(|col| col[row]).collect();
        if let Some(values) = values {
            dates.push(*date);
            prices.push(values);
        }
    }

    log::debug!(
        "aligned {} assets: {} timeline dates, {} complete rows",
        series.len(),
        timeline.len(),
        dates.len()
    );

    if dates.len() < min_rows {
        return Err(QuantError::InsufficientData {
            code: "universe".to_string(),
            rows: dates.len(),
            minimum: min_rows,
        });
    }

    Ok(AssetUniverse {
        codes: series.iter().map(|s| s.code().to_string()).collect(),
        dates,
        prices,
    })
}

pub struct UniverseLoadResult {
    pub series: Vec<PriceSeries>,
    pub skipped: Vec<SkippedCode>,
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    Unreadable(String),
}

/// Fetches every code's prices, skipping (with a warning) the ones that
/// cannot be loaded. Fails only when nothing could be loaded.
pub fn load_universe(
    data_port: &dyn MarketDataPort,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<UniverseLoadResult, QuantError> {
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        match data_port.fetch_prices(code, start_date, end_date) {
            Ok(series) if series.is_empty() => {
                log::warn!("skipping {} (no data in range)", code);
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::NoData,
                });
            }
            Ok(series) => {
                log::info!("  {}: {} bars [OK]", code, series.len());
                loaded.push(series);
            }
            Err(e) => {
                log::warn!("skipping {} ({})", code, e);
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::Unreadable(e.to_string()),
                });
            }
        }
    }

    if loaded.is_empty() {
        return Err(QuantError::NoData {
            code: codes.join(","),
        });
    }

    Ok(UniverseLoadResult {
        series: loaded,
        skipped,
    })
}
