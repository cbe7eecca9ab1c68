//! Analyst ratings and the per-asset fundamental record.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
    Unknown,
}

impl Rating {
    /// Normalizes a provider recommendation key such as `strong_buy` or
    /// `underperform`. Unrecognized keys map to `Unknown`.
    pub fn from_key(key: &str) -> Rating {
        let normalized = key.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "strong_buy" => Rating::StrongBuy,
            "buy" | "outperform" => Rating::Buy,
            "hold" => Rating::Hold,
            "sell" | "underperform" => Rating::Sell,
            "strong_sell" => Rating::StrongSell,
            _ => Rating::Unknown,
        }
    }

    pub fn score(self) -> i32 {
        match self {
            Rating::StrongBuy | Rating::Buy => 2,
            Rating::Sell | Rating::StrongSell => -1,
            Rating::Hold | Rating::Unknown => 0,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::StrongBuy => "Strong Buy",
            Rating::Buy => "Buy",
            Rating::Hold => "Hold",
            Rating::Sell => "Sell",
            Rating::StrongSell => "Strong Sell",
            Rating::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// Provider fundamentals for one asset. Every field is optional; providers
/// routinely omit any of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundamentalSnapshot {
    pub code: String,
    pub recommendation_key: Option<String>,
    pub recommendation_mean: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub beta: Option<f64>,
    pub country: Option<String>,
}

impl FundamentalSnapshot {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// `None` when the provider gave no recommendation key at all.
    pub fn rating(&self) -> Option<Rating> {
        self.recommendation_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(Rating::from_key)
    }

    /// Display form of the ratios the provider supplied, in a fixed order.
    /// ROE and dividend yield arrive as fractions and are shown as percents.
    pub fn metrics(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(v) = self.trailing_pe {
            out.push(format!("P/E {:.2}", v));
        }
        if let Some(v) = self.price_to_book {
            out.push(format!("P/B {:.2}", v));
        }
        if let Some(v) = self.return_on_equity {
            out.push(format!("ROE {:.2}%", v * 100.0));
        }
        if let Some(v) = self.dividend_yield {
            out.push(format!("dividend yield {:.2}%", v * 100.0));
        }
        if let Some(v) = self.recommendation_mean {
            out.push(format!("analyst mean {:.2}", v));
        }
        if let Some(v) = self.beta {
            out.push(format!("beta {:.2}", v));
        }
        out
    }
}
