//! Configuration reading and validation.
//!
//! Every section is checked before a pipeline runs, so a bad value is
//! reported as `ConfigInvalid` with its section and key instead of surfacing
//! later as a domain error.

use crate::domain::error::QuantError;
use crate::domain::optimizer::Objective;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> QuantError {
    QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> QuantError {
    QuantError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Non-empty string value, or `ConfigMissing`.
pub fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, QuantError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(missing(section, key)),
    }
}

/// Number at `[section] key`, `default` when absent. A non-numeric value is
/// an error, never a silent default.
pub fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, QuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => {
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(section, key, format!("'{}' is not a number", raw)))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(invalid(section, key, "must be finite"))
            }
        }
    }
}

pub fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, QuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            invalid(
                section,
                key,
                format!("'{}' is not a non-negative integer", raw),
            )
        }),
    }
}

pub fn read_i32(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i32,
) -> Result<i32, QuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, format!("'{}' is not an integer", raw))),
    }
}

pub fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, QuantError> {
    let raw = require_string(config, section, key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| invalid(section, key, "invalid date format (expected YYYY-MM-DD)"))
}

/// Parses `CODE:weight` pairs separated by commas.
pub fn parse_weights(raw: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut weights = BTreeMap::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (code, weight) = item
            .split_once(':')
            .ok_or_else(|| format!("'{}' is not CODE:weight", item))?;
        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| format!("weight for {} is not a number", code.trim()))?;
        if !(weight >= 0.0 && weight.is_finite()) {
            return Err(format!("weight for {} must be >= 0", code.trim()));
        }
        let code = code.trim().to_uppercase();
        if weights.insert(code.clone(), weight).is_some() {
            return Err(format!("duplicate code {}", code));
        }
    }
    Ok(weights)
}

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_data_config(config)?;
    validate_indicator_config(config)?;
    validate_backtest_config(config)?;
    validate_optimizer_config(config)?;
    validate_risk_config(config)?;
    validate_scoring_config(config)?;
    validate_contribution_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_data_range(config)?;
    let codes = require_string(config, "data", "codes")?;
    parse_codes(&codes).map_err(|e| invalid("data", "codes", e.to_string()))?;
    Ok(())
}

/// Directory and date range only; codes may come from the command line.
pub fn validate_data_range(config: &dyn ConfigPort) -> Result<(), QuantError> {
    require_string(config, "data", "directory")?;
    let start = read_date(config, "data", "start_date")?;
    let end = read_date(config, "data", "end_date")?;
    if start >= end {
        return Err(invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let short = read_usize(config, "indicators", "short_window", 50)?;
    let long = read_usize(config, "indicators", "long_window", 200)?;
    let rsi = read_usize(config, "indicators", "rsi_window", 14)?;
    if short < 1 {
        return Err(invalid("indicators", "short_window", "must be at least 1"));
    }
    if long <= short {
        return Err(invalid(
            "indicators",
            "long_window",
            "long_window must be greater than short_window",
        ));
    }
    if rsi < 1 {
        return Err(invalid("indicators", "rsi_window", "must be at least 1"));
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let periods = read_f64(config, "backtest", "periods_per_year", 252.0)?;
    if periods <= 0.0 {
        return Err(invalid("backtest", "periods_per_year", "must be positive"));
    }
    let rf = read_f64(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&rf) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

pub fn validate_optimizer_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if let Some(raw) = config.get_string("optimizer", "objective") {
        raw.parse::<Objective>()
            .map_err(|e| invalid("optimizer", "objective", e.to_string()))?;
    }
    if read_f64(config, "optimizer", "l2_gamma", 0.1)? < 0.0 {
        return Err(invalid("optimizer", "l2_gamma", "must be non-negative"));
    }
    let cutoff = read_f64(config, "optimizer", "weight_cutoff", 1e-4)?;
    if !(0.0..1.0).contains(&cutoff) {
        return Err(invalid("optimizer", "weight_cutoff", "must be in [0, 1)"));
    }
    if read_usize(config, "optimizer", "max_iterations", 20_000)? < 1 {
        return Err(invalid("optimizer", "max_iterations", "must be at least 1"));
    }
    if read_f64(config, "optimizer", "tolerance", 1e-10)? <= 0.0 {
        return Err(invalid("optimizer", "tolerance", "must be positive"));
    }
    if read_usize(config, "optimizer", "min_rows", 30)? < 2 {
        return Err(invalid("optimizer", "min_rows", "must be at least 2"));
    }
    if let Some(raw) = config.get_string("optimizer", "universe") {
        let value = raw.trim().to_lowercase();
        if value != "all" && value != "recommended" {
            return Err(invalid("optimizer", "universe", "must be all or recommended"));
        }
    }
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let c = read_f64(config, "risk", "confidence", 0.95)?;
    if !(c > 0.0 && c < 1.0) {
        return Err(invalid("risk", "confidence", "must be strictly between 0 and 1"));
    }
    Ok(())
}

pub fn validate_scoring_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let oversold = read_f64(config, "scoring", "oversold", 30.0)?;
    let overbought = read_f64(config, "scoring", "overbought", 70.0)?;
    if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
        return Err(invalid("scoring", "oversold", "RSI bands must lie within [0, 100]"));
    }
    if oversold >= overbought {
        return Err(invalid(
            "scoring",
            "overbought",
            "overbought must be greater than oversold",
        ));
    }
    let buy = read_i32(config, "scoring", "buy_threshold", 3)?;
    let sell = read_i32(config, "scoring", "sell_threshold", 0)?;
    if sell >= buy {
        return Err(invalid(
            "scoring",
            "buy_threshold",
            "buy_threshold must be greater than sell_threshold",
        ));
    }
    Ok(())
}

pub fn validate_contribution_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    if read_f64(config, "contribution", "current_value", 0.0)? < 0.0 {
        return Err(invalid("contribution", "current_value", "must be non-negative"));
    }
    if read_f64(config, "contribution", "amount", 0.0)? < 0.0 {
        return Err(invalid("contribution", "amount", "must be non-negative"));
    }
    if let Some(raw) = config.get_string("contribution", "current_weights") {
        parse_weights(&raw).map_err(|e| invalid("contribution", "current_weights", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const VALID: &str = r#"
[data]
directory = ./data
start_date = 2020-01-01
end_date = 2024-12-31
codes = AAPL, PETR4.SA

[indicators]
short_window = 50
long_window = 200
rsi_window = 14

[backtest]
risk_free_rate = 0.02

[optimizer]
objective = min_volatility
l2_gamma = 0.1

[risk]
confidence = 0.95

[scoring]
oversold = 30
overbought = 70

[contribution]
current_value = 10000
amount = 2000
current_weights = AAPL:0.5, PETR4.SA:0.5
"#;

    #[test]
    fn valid_config_passes() {
        assert!(validate_all(&make_config(VALID)).is_ok());
    }

    #[test]
    fn defaults_cover_optional_sections() {
        let config = make_config(
            "[data]\ndirectory = d\nstart_date = 2020-01-01\nend_date = 2021-01-01\ncodes = A,B\n",
        );
        assert!(validate_all(&config).is_ok());
    }

    #[test]
    fn missing_directory() {
        let config =
            make_config("[data]\nstart_date = 2020-01-01\nend_date = 2021-01-01\ncodes = A\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigMissing { key, .. } if key == "directory"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config(
            "[data]\ndirectory = d\nstart_date = 2024-01-01\nend_date = 2020-01-01\ncodes = A\n",
        );
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn bad_date_format() {
        let config = make_config(
            "[data]\ndirectory = d\nstart_date = 01/01/2020\nend_date = 2021-01-01\ncodes = A\n",
        );
        assert!(matches!(
            validate_data_config(&config),
            Err(QuantError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn duplicate_codes_fail() {
        let config = make_config(
            "[data]\ndirectory = d\nstart_date = 2020-01-01\nend_date = 2021-01-01\ncodes = A, a\n",
        );
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "codes"));
    }

    #[test]
    fn short_window_must_be_below_long() {
        let config = make_config("[indicators]\nshort_window = 200\nlong_window = 50\n");
        let err = validate_indicator_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "long_window"));
    }

    #[test]
    fn non_numeric_window_is_invalid_not_defaulted() {
        let config = make_config("[indicators]\nrsi_window = fourteen\n");
        let err = validate_indicator_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "rsi_window"));
    }

    #[test]
    fn risk_free_rate_range() {
        let config = make_config("[backtest]\nrisk_free_rate = 1.5\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn unknown_objective() {
        let config = make_config("[optimizer]\nobjective = efficient_risk\n");
        let err = validate_optimizer_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "objective"));
    }

    #[test]
    fn optimizer_universe_values() {
        let config = make_config("[optimizer]\nuniverse = Recommended\n");
        assert!(validate_optimizer_config(&config).is_ok());
        let config = make_config("[optimizer]\nuniverse = top10\n");
        let err = validate_optimizer_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "universe"));
    }

    #[test]
    fn negative_gamma() {
        let config = make_config("[optimizer]\nl2_gamma = -0.1\n");
        assert!(validate_optimizer_config(&config).is_err());
    }

    #[test]
    fn confidence_bounds() {
        for bad in ["0", "1", "1.2", "-0.5"] {
            let config = make_config(&format!("[risk]\nconfidence = {}\n", bad));
            assert!(validate_risk_config(&config).is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn scoring_bands_inverted() {
        let config = make_config("[scoring]\noversold = 80\noverbought = 20\n");
        assert!(validate_scoring_config(&config).is_err());
    }

    #[test]
    fn scoring_thresholds_inverted() {
        let config = make_config("[scoring]\nbuy_threshold = 0\nsell_threshold = 2\n");
        assert!(validate_scoring_config(&config).is_err());
    }

    #[test]
    fn parse_weights_pairs() {
        let weights = parse_weights("aapl:0.6, MSFT : 0.4").unwrap();
        assert_eq!(weights.get("AAPL"), Some(&0.6));
        assert_eq!(weights.get("MSFT"), Some(&0.4));
    }

    #[test]
    fn parse_weights_errors() {
        assert!(parse_weights("AAPL").is_err());
        assert!(parse_weights("AAPL:x").is_err());
        assert!(parse_weights("AAPL:-0.1").is_err());
        assert!(parse_weights("AAPL:0.5,aapl:0.5").is_err());
    }

    #[test]
    fn bad_contribution_weights() {
        let config = make_config("[contribution]\ncurrent_weights = AAPL=0.5\n");
        let err = validate_contribution_config(&config).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "current_weights"));
    }
}
