//! RSI (Relative Strength Index).
//!
//! Average gain/loss are simple rolling means of the last n price changes:
//! - change[t] = C[t] - C[t-1]
//! - gain = max(change, 0), loss = max(-change, 0)
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both are 0 (no movement): RSI = 50
//!
//! Warmup: first n points are undefined (n changes are needed for the first average).

use crate::domain::error::QuantError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_rsi(series: &PriceSeries, window: usize) -> Result<IndicatorSeries, QuantError> {
    let values = rsi_values(&series.adjusted_closes(), window)?;
    Ok(IndicatorSeries::from_parts(
        IndicatorType::Rsi(window),
        &series.dates(),
        values,
    ))
}

pub(crate) fn rsi_values(prices: &[f64], window: usize) -> Result<Vec<Option<f64>>, QuantError> {
    if window < 1 {
        return Err(QuantError::invalid("RSI window must be >= 1"));
    }

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    for pair in prices.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut values = Vec::with_capacity(prices.len());
    for i in 0..prices.len() {
        if i < window {
            values.push(None);
            continue;
        }
        // changes[i - window .. i] are the n deltas ending at price i
        let avg_gain = gains[i - window..i].iter().sum::<f64>() / window as f64;
        let avg_loss = losses[i - window..i].iter().sum::<f64>() / window as f64;
        values.push(Some(rsi_from_averages(avg_gain, avg_loss)));
    }
    Ok(values)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
