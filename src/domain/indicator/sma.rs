//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n over adjusted closes.
//! Warmup: first (n-1) points are undefined.

use crate::domain::error::QuantError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

/// Trailing mean of `window` values ending at each index.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, QuantError> {
    if window < 1 {
        return Err(QuantError::invalid("window must be >= 1"));
    }

    let out = (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect();
    Ok(out)
}

pub fn calculate_sma(series: &PriceSeries, window: usize) -> Result<IndicatorSeries, QuantError> {
    let values = rolling_mean(&series.adjusted_closes(), window)?;
    Ok(IndicatorSeries::from_parts(
        IndicatorType::Sma(window),
        &series.dates(),
        values,
    ))
}
