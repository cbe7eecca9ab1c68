#![allow(dead_code)]

use chrono::NaiveDate;
use quantfolio::cli::DataRequest;
use quantfolio::domain::error::QuantError;
use quantfolio::domain::fundamentals::FundamentalSnapshot;
use quantfolio::domain::macro_outlook::MacroOutlook;
pub use quantfolio::domain::ohlcv::{OhlcvBar, PriceSeries};
use quantfolio::ports::data_port::MarketDataPort;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub fundamentals: HashMap<String, FundamentalSnapshot>,
    pub outlooks: HashMap<String, MacroOutlook>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fundamentals: HashMap::new(),
            outlooks: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_prices(self, code: &str, prices: &[f64]) -> Self {
        self.with_bars(code, bars_from_prices("2023-01-02", prices))
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn with_rating(mut self, code: &str, key: &str, country: &str) -> Self {
        let mut snapshot = FundamentalSnapshot::new(code);
        snapshot.recommendation_key = Some(key.to_string());
        snapshot.country = Some(country.to_string());
        self.fundamentals.insert(code.to_string(), snapshot);
        self
    }

    pub fn with_outlook(mut self, country: &str, outlook: MacroOutlook) -> Self {
        self.outlooks.insert(country.to_string(), outlook);
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_prices(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, QuantError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(QuantError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(code, bars)
    }

    fn fetch_fundamentals(&self, code: &str) -> Result<FundamentalSnapshot, QuantError> {
        self.fundamentals
            .get(code)
            .cloned()
            .ok_or_else(|| QuantError::MissingInput {
                code: code.to_string(),
                input: "fundamentals".to_string(),
            })
    }

    fn fetch_macro_outlook(&self, country: &str) -> Result<MacroOutlook, QuantError> {
        self.outlooks
            .get(country)
            .copied()
            .ok_or_else(|| QuantError::MissingInput {
                code: country.to_string(),
                input: "macro outlook".to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        adj_close: close,
        volume: 1000,
    }
}

/// One bar per calendar day starting at `start_date`.
pub fn bars_from_prices(start_date: &str, prices: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: p,
            high: p * 1.01,
            low: p * 0.99,
            close: p,
            adj_close: p,
            volume: 1000,
        })
        .collect()
}

pub fn series(code: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::new(code, bars_from_prices("2023-01-02", prices)).unwrap()
}

pub fn linear_prices(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Compounds a deterministic oscillating return stream: `drift` per period
/// plus a sine of the given amplitude, frequency and phase.
pub fn oscillating_prices(
    count: usize,
    drift: f64,
    amplitude: f64,
    freq: f64,
    phase: f64,
) -> Vec<f64> {
    let mut price = 100.0;
    let mut out = Vec::with_capacity(count);
    out.push(price);
    for t in 1..count {
        price *= 1.0 + drift + amplitude * (freq * t as f64 + phase).sin();
        out.push(price);
    }
    out
}

/// Three assets with distinct return cycles and a positive drift.
pub fn three_asset_port(rows: usize) -> MockDataPort {
    MockDataPort::new()
        .with_prices("AAA", &oscillating_prices(rows, 0.0008, 0.010, 0.9, 0.0))
        .with_prices("BBB", &oscillating_prices(rows, 0.0005, 0.012, 2.3, 1.0))
        .with_prices("CCC", &oscillating_prices(rows, 0.0003, 0.007, 1.7, 2.0))
}

pub fn sample_request(codes: &[&str]) -> DataRequest {
    DataRequest {
        directory: PathBuf::from("unused"),
        start_date: date(2023, 1, 1),
        end_date: date(2025, 12, 31),
        codes: codes.iter().map(|c| c.to_string()).collect(),
    }
}
