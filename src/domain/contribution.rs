//! Contribution planning toward a target allocation.

use crate::domain::error::QuantError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ContributionSuggestion {
    pub code: String,
    pub target_value: f64,
    pub current_value: f64,
    /// Negative when the asset is already above its target value.
    pub contribution: f64,
}

/// For each asset in `optimal_weights`, how much cash moves it from its
/// current holding to `(current_value + new_amount) * optimal_weight`.
/// Assets missing from `current_weights` are treated as not held.
pub fn suggest_contributions(
    current_value: f64,
    current_weights: &BTreeMap<String, f64>,
    optimal_weights: &[(String, f64)],
    new_amount: f64,
) -> Result<Vec<ContributionSuggestion>, QuantError> {
    if !(current_value >= 0.0 && current_value.is_finite()) {
        return Err(QuantError::invalid("current portfolio value must be >= 0"));
    }
    if !(new_amount >= 0.0 && new_amount.is_finite()) {
        return Err(QuantError::invalid("contribution amount must be >= 0"));
    }
    if let Some((code, w)) = current_weights
        .iter()
        .find(|(_, w)| !(**w >= 0.0 && w.is_finite()))
    {
        return Err(QuantError::invalid(format!(
            "current weight for {} must be >= 0, got {}",
            code, w
        )));
    }

    let total = current_value + new_amount;
    let suggestions = optimal_weights
        .iter()
        .map(|(code, weight)| {
            let target_value = total * weight;
            let held = current_value * current_weights.get(code).copied().unwrap_or(0.0);
            ContributionSuggestion {
                code: code.clone(),
                target_value,
                current_value: held,
                contribution: target_value - held,
            }
        })
        .collect();

    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn weights(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(c, w)| (c.to_string(), *w)).collect()
    }

    #[test]
    fn rebalances_toward_target() {
        let current: BTreeMap<String, f64> =
            weights(&[("A", 0.5), ("B", 0.5)]).into_iter().collect();
        let optimal = weights(&[("A", 0.7), ("B", 0.3)]);
        let s = suggest_contributions(10_000.0, &current, &optimal, 2_000.0).unwrap();

        assert_relative_eq!(s[0].target_value, 8_400.0);
        assert_relative_eq!(s[0].current_value, 5_000.0);
        assert_relative_eq!(s[0].contribution, 3_400.0);
        assert_relative_eq!(s[1].contribution, 3_600.0 - 5_000.0);

        let total: f64 = s.iter().map(|x| x.contribution).sum();
        assert_relative_eq!(total, 2_000.0, epsilon = 1e-9);
    }

    #[test]
    fn unheld_asset_gets_full_target() {
        let current = BTreeMap::new();
        let optimal = weights(&[("NEW", 1.0)]);
        let s = suggest_contributions(0.0, &current, &optimal, 500.0).unwrap();
        assert_eq!(s[0].current_value, 0.0);
        assert_relative_eq!(s[0].contribution, 500.0);
    }

    #[test]
    fn rejects_negative_inputs() {
        let current = BTreeMap::new();
        let optimal = weights(&[("A", 1.0)]);
        assert!(suggest_contributions(-1.0, &current, &optimal, 0.0).is_err());
        assert!(suggest_contributions(1.0, &current, &optimal, -5.0).is_err());

        let bad: BTreeMap<String, f64> = weights(&[("A", -0.2)]).into_iter().collect();
        assert!(suggest_contributions(1.0, &bad, &optimal, 0.0).is_err());
    }
}
