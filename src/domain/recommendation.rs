//! Composite recommendation scorer.
//!
//! Each asset gets an integer score from three independent inputs,
//! evaluated in a fixed order (RSI, analyst rating, macro outlook). A
//! missing rating or macro outlook contributes zero and leaves a
//! justification behind; a missing indicator snapshot short-circuits to
//! `InsufficientData`.

use crate::domain::error::QuantError;
use crate::domain::fundamentals::{FundamentalSnapshot, Rating};
use crate::domain::indicator::IndicatorSeries;
use crate::domain::macro_outlook::MacroOutlook;
use rayon::prelude::*;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub oversold: f64,
    pub overbought: f64,
    pub buy_threshold: i32,
    pub sell_threshold: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            buy_threshold: 3,
            sell_threshold: 0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), QuantError> {
        if !(0.0..=100.0).contains(&self.oversold) || !(0.0..=100.0).contains(&self.overbought) {
            return Err(QuantError::invalid("RSI bands must lie within [0, 100]"));
        }
        if self.oversold >= self.overbought {
            return Err(QuantError::invalid(format!(
                "oversold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }
        if self.sell_threshold >= self.buy_threshold {
            return Err(QuantError::invalid(format!(
                "sell threshold ({}) must be below buy threshold ({})",
                self.sell_threshold, self.buy_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub latest_rsi: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn from_series(rsi: &IndicatorSeries) -> Self {
        Self {
            latest_rsi: rsi.latest(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetSignals {
    pub code: String,
    pub country: Option<String>,
    pub indicators: Option<IndicatorSnapshot>,
    pub rating: Option<Rating>,
    pub macro_outlook: Option<MacroOutlook>,
    pub fundamentals: Option<FundamentalSnapshot>,
}

impl AssetSignals {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            country: None,
            indicators: None,
            rating: None,
            macro_outlook: None,
            fundamentals: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Buy,
    HoldNeutral,
    SellAvoid,
    InsufficientData,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::Buy => "Buy",
            Recommendation::HoldNeutral => "Hold/Neutral",
            Recommendation::SellAvoid => "Sell/Avoid",
            Recommendation::InsufficientData => "InsufficientData",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRecord {
    pub code: String,
    pub score: i32,
    pub label: Recommendation,
    pub justifications: Vec<String>,
    /// Carried through unscored so reports can show the ratios beside the label.
    pub fundamentals: Option<FundamentalSnapshot>,
}

pub fn classify(score: i32, config: &ScoringConfig) -> Recommendation {
    if score >= config.buy_threshold {
        Recommendation::Buy
    } else if score <= config.sell_threshold {
        Recommendation::SellAvoid
    } else {
        Recommendation::HoldNeutral
    }
}

pub fn score_asset(signals: &AssetSignals, config: &ScoringConfig) -> RecommendationRecord {
    let Some(indicators) = signals.indicators else {
        return RecommendationRecord {
            code: signals.code.clone(),
            score: 0,
            label: Recommendation::InsufficientData,
            justifications: vec!["no price history available for indicator analysis".to_string()],
            fundamentals: signals.fundamentals.clone(),
        };
    };

    let mut score = 0;
    let mut justifications = Vec::with_capacity(3);

    match indicators.latest_rsi {
        Some(rsi) if rsi < config.oversold => {
            score += 2;
            justifications.push(format!("RSI {:.2}: oversold (< {})", rsi, config.oversold));
        }
        Some(rsi) if rsi > config.overbought => {
            score -= 1;
            justifications.push(format!(
                "RSI {:.2}: overbought (> {})",
                rsi, config.overbought
            ));
        }
        Some(rsi) => {
            score += 1;
            justifications.push(format!("RSI {:.2}: within normal band", rsi));
        }
        None => justifications.push("RSI not available".to_string()),
    }

    match signals.rating {
        Some(rating) => {
            score += rating.score();
            justifications.push(format!("analyst rating: {}", rating));
        }
        None => justifications.push("analyst rating not available".to_string()),
    }

    let country = signals.country.as_deref().unwrap_or("unknown country");
    match signals.macro_outlook {
        Some(outlook) => {
            score += outlook.score();
            justifications.push(format!("macro outlook ({}): {}", country, outlook));
        }
        None => justifications.push(format!("macro outlook ({}) not available", country)),
    }

    RecommendationRecord {
        code: signals.code.clone(),
        score,
        label: classify(score, config),
        justifications,
        fundamentals: signals.fundamentals.clone(),
    }
}

/// Codes worth carrying into portfolio construction: Buy or Hold/Neutral.
pub fn investable_codes(records: &[RecommendationRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| matches!(r.label, Recommendation::Buy | Recommendation::HoldNeutral))
        .map(|r| r.code.clone())
        .collect()
}

/// Scores every asset in parallel; output order follows input order.
pub fn recommend_batch(
    inputs: &[AssetSignals],
    config: &ScoringConfig,
) -> Vec<RecommendationRecord> {
    inputs.par_iter().map(|s| score_asset(s, config)).collect()
}
