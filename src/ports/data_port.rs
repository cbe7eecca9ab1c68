//! Market data access port trait.

use crate::domain::error::QuantError;
use crate::domain::fundamentals::FundamentalSnapshot;
use crate::domain::macro_outlook::MacroOutlook;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

/// Source of prices, fundamentals and macro outlooks.
///
/// Absent fundamentals or macro data are reported as
/// `QuantError::MissingInput`, which callers treat as non-fatal.
pub trait MarketDataPort {
    /// Bars with `start_date <= date <= end_date`, oldest first. An empty
    /// series means the code exists but has no bars in range.
    fn fetch_prices(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, QuantError>;

    fn fetch_fundamentals(&self, code: &str) -> Result<FundamentalSnapshot, QuantError>;

    fn fetch_macro_outlook(&self, country: &str) -> Result<MacroOutlook, QuantError>;

    fn list_symbols(&self) -> Result<Vec<String>, QuantError>;
}
