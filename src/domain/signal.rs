//! SMA crossover signal generation.
//!
//! The target exposure at t is 1.0 (long) when SMA_short[t] > SMA_long[t]
//! and 0.0 (flat) otherwise, including while either average is warming up.
//! No leverage, no shorting.

use crate::domain::error::QuantError;
use crate::domain::indicator::IndicatorSeries;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverWindows {
    short: usize,
    long: usize,
}

impl CrossoverWindows {
    pub fn new(short: usize, long: usize) -> Result<Self, QuantError> {
        if short < 1 {
            return Err(QuantError::invalid("short window must be >= 1"));
        }
        if short >= long {
            return Err(QuantError::invalid(format!(
                "short window ({}) must be less than long window ({})",
                short, long
            )));
        }
        Ok(Self { short, long })
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub weight: f64,
}

pub fn sma_crossover(
    short: &IndicatorSeries,
    long: &IndicatorSeries,
) -> Result<Vec<SignalPoint>, QuantError> {
    if short.len() != long.len() {
        return Err(QuantError::invalid(format!(
            "{} has {} points but {} has {}",
            short.indicator_type,
            short.len(),
            long.indicator_type,
            long.len()
        )));
    }

    let signals = short
        .values
        .iter()
        .zip(&long.values)
        .map(|(s, l)| {
            let weight = match (s.value, l.value) {
                (Some(s), Some(l)) if s > l => 1.0,
                _ => 0.0,
            };
            SignalPoint {
                date: s.date,
                weight,
            }
        })
        .collect();
    Ok(signals)
}

/// Number of times the target exposure flips between flat and long.
pub fn count_exposure_changes(signals: &[SignalPoint]) -> usize {
    signals
        .windows(2)
        .filter(|w| w[0].weight != w[1].weight)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorPoint, IndicatorType};

    fn series(kind: IndicatorType, values: &[Option<f64>]) -> IndicatorSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        IndicatorSeries {
            indicator_type: kind,
            values: values
                .iter()
                .enumerate()
                .map(|(i, &value)| IndicatorPoint {
                    date: start + chrono::Duration::days(i as i64),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn windows_must_be_ordered() {
        assert!(CrossoverWindows::new(20, 50).is_ok());
        assert!(matches!(
            CrossoverWindows::new(50, 50),
            Err(QuantError::InvalidParameter { .. })
        ));
        assert!(CrossoverWindows::new(60, 50).is_err());
        assert!(CrossoverWindows::new(0, 50).is_err());
    }

    #[test]
    fn long_when_short_above_long() {
        let short = series(IndicatorType::Sma(2), &[None, Some(11.0), Some(9.0), Some(12.0)]);
        let long = series(IndicatorType::Sma(3), &[None, None, Some(10.0), Some(10.0)]);
        let signals = sma_crossover(&short, &long).unwrap();
        let weights: Vec<f64> = signals.iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn equal_averages_are_flat() {
        let short = series(IndicatorType::Sma(2), &[Some(10.0)]);
        let long = series(IndicatorType::Sma(3), &[Some(10.0)]);
        assert_eq!(sma_crossover(&short, &long).unwrap()[0].weight, 0.0);
    }

    #[test]
    fn length_mismatch_fails() {
        let short = series(IndicatorType::Sma(2), &[Some(1.0), Some(2.0)]);
        let long = series(IndicatorType::Sma(3), &[Some(1.0)]);
        assert!(sma_crossover(&short, &long).is_err());
    }

    #[test]
    fn exposure_changes() {
        let short = series(
            IndicatorType::Sma(2),
            &[Some(2.0), Some(2.0), Some(0.0), Some(2.0)],
        );
        let long = series(IndicatorType::Sma(3), &[Some(1.0); 4]);
        let signals = sma_crossover(&short, &long).unwrap();
        assert_eq!(count_exposure_changes(&signals), 2);
    }
}
