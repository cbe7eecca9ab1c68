//! Country-level macro outlook.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroOutlook {
    Positive,
    Neutral,
    Negative,
}

/// Annual inflation (percent) above which the outlook turns negative.
pub const HIGH_INFLATION: f64 = 7.0;
/// Annual inflation (percent) below which the outlook turns positive.
pub const LOW_INFLATION: f64 = 3.0;

impl MacroOutlook {
    /// Accepts bare labels as well as annotated ones like
    /// "Negative (high inflation)". Portuguese labels are also recognized.
    pub fn from_label(label: &str) -> Option<MacroOutlook> {
        let lower = label.trim().to_lowercase();
        if lower.contains("positiv") {
            Some(MacroOutlook::Positive)
        } else if lower.contains("negativ") {
            Some(MacroOutlook::Negative)
        } else if lower.contains("neutr") {
            Some(MacroOutlook::Neutral)
        } else {
            None
        }
    }

    pub fn from_inflation(annual_rate_percent: f64) -> MacroOutlook {
        if annual_rate_percent > HIGH_INFLATION {
            MacroOutlook::Negative
        } else if annual_rate_percent < LOW_INFLATION {
            MacroOutlook::Positive
        } else {
            MacroOutlook::Neutral
        }
    }

    pub fn score(self) -> i32 {
        match self {
            MacroOutlook::Positive => 1,
            MacroOutlook::Neutral => 0,
            MacroOutlook::Negative => -1,
        }
    }
}

impl fmt::Display for MacroOutlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroOutlook::Positive => write!(f, "Positive"),
            MacroOutlook::Neutral => write!(f, "Neutral"),
            MacroOutlook::Negative => write!(f, "Negative"),
        }
    }
}

/// Country for a listing code: `.SA` listings are Brazilian, everything
/// else is treated as US.
pub fn country_for_code(code: &str) -> &'static str {
    if code.to_uppercase().ends_with(".SA") {
        "BR"
    } else {
        "US"
    }
}
