//! CSV file market data adapter.
//!
//! Directory layout:
//! - `<CODE>.csv`: `Date,Open,High,Low,Close,Adj Close,Volume`
//! - `fundamentals.csv`: one row per code, every column but `code` optional
//! - `macro.csv`: `country,outlook,inflation`, either of the last two may be blank

use crate::domain::error::QuantError;
use crate::domain::fundamentals::FundamentalSnapshot;
use crate::domain::macro_outlook::MacroOutlook;
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";
pub const MACRO_FILE: &str = "macro.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<f64>,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FundamentalsRow {
    code: String,
    recommendation_key: Option<String>,
    recommendation_mean: Option<f64>,
    trailing_pe: Option<f64>,
    price_to_book: Option<f64>,
    dividend_yield: Option<f64>,
    return_on_equity: Option<f64>,
    beta: Option<f64>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MacroRow {
    country: String,
    outlook: Option<String>,
    inflation: Option<f64>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn price_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn reader(path: &Path) -> Result<csv::Reader<fs::File>, QuantError> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(QuantError::from)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(raw: &str) -> Result<NaiveDate, QuantError> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| QuantError::Data {
        reason: format!("invalid date '{}': {}", raw, e),
    })
}

impl MarketDataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, QuantError> {
        let path = self.price_path(code);
        if !path.exists() {
            return Err(QuantError::NoData {
                code: code.to_string(),
            });
        }

        let mut rdr = Self::reader(&path)?;
        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.deserialize() {
            let row: PriceRow = result.map_err(|e| QuantError::Data {
                reason: format!("{}: {}", path.display(), e),
            })?;
            let date = parse_date(&row.date)?;
            if date < start_date || date > end_date {
                continue;
            }

            let Some(close) = row.close else {
                skipped += 1;
                continue;
            };
            let adj_close = row.adj_close.unwrap_or(close);
            if !(adj_close > 0.0 && adj_close.is_finite()) {
                skipped += 1;
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: row.open.unwrap_or(close),
                high: row.high.unwrap_or(close),
                low: row.low.unwrap_or(close),
                close,
                adj_close,
                volume: row.volume.map(|v| v as i64).unwrap_or(0),
            });
        }

        if skipped > 0 {
            log::debug!("{}: skipped {} rows without a usable close", code, skipped);
        }

        bars.sort_by_key(|b| b.date);
        PriceSeries::new(code, bars)
    }

    fn fetch_fundamentals(&self, code: &str) -> Result<FundamentalSnapshot, QuantError> {
        let missing = || QuantError::MissingInput {
            code: code.to_string(),
            input: "fundamentals".to_string(),
        };

        let path = self.base_path.join(FUNDAMENTALS_FILE);
        if !path.exists() {
            return Err(missing());
        }

        let mut rdr = Self::reader(&path)?;
        for result in rdr.deserialize() {
            let row: FundamentalsRow = result?;
            if row.code.eq_ignore_ascii_case(code) {
                return Ok(FundamentalSnapshot {
                    code: code.to_string(),
                    recommendation_key: row.recommendation_key,
                    recommendation_mean: row.recommendation_mean,
                    trailing_pe: row.trailing_pe,
                    price_to_book: row.price_to_book,
                    dividend_yield: row.dividend_yield,
                    return_on_equity: row.return_on_equity,
                    beta: row.beta,
                    country: row.country,
                });
            }
        }
        Err(missing())
    }

    fn fetch_macro_outlook(&self, country: &str) -> Result<MacroOutlook, QuantError> {
        let missing = || QuantError::MissingInput {
            code: country.to_string(),
            input: "macro outlook".to_string(),
        };

        let path = self.base_path.join(MACRO_FILE);
        if !path.exists() {
            return Err(missing());
        }

        let mut rdr = Self::reader(&path)?;
        for result in rdr.deserialize() {
            let row: MacroRow = result?;
            if !row.country.eq_ignore_ascii_case(country) {
                continue;
            }
            if let Some(outlook) = row.outlook.as_deref().and_then(MacroOutlook::from_label) {
                return Ok(outlook);
            }
            if let Some(inflation) = row.inflation {
                return Ok(MacroOutlook::from_inflation(inflation));
            }
        }
        Err(missing())
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| QuantError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();
            if name_str == FUNDAMENTALS_FILE || name_str == MACRO_FILE {
                continue;
            }
            if let Some(code) = name_str.strip_suffix(".csv") {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
