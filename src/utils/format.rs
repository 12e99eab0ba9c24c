//! Human-readable number formatting for reports.

use serde::Serialize;

/// Format an integer with thousands separators, e.g. `1234567` -> `1,234,567`
pub fn commas(number: u64) -> String {
    let digits = number.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// How a curation's interventions-per-gigabase compares to typical assemblies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionBand {
    None,
    VeryLow,
    BelowAverage,
    AroundAverage,
    AboveAverage,
    ModeratelyHigh,
    High,
    VeryHigh,
    UnusuallyHigh,
}

impl InterventionBand {
    pub fn from_rate(per_gb: f64) -> Self {
        match per_gb {
            r if r <= 0.0 => Self::None,
            r if r < 30.0 => Self::VeryLow,
            r if r < 50.0 => Self::BelowAverage,
            r if r < 200.0 => Self::AroundAverage,
            r if r < 350.0 => Self::AboveAverage,
            r if r < 400.0 => Self::ModeratelyHigh,
            r if r < 550.0 => Self::High,
            r if r < 950.0 => Self::VeryHigh,
            _ => Self::UnusuallyHigh,
        }
    }
}

impl std::fmt::Display for InterventionBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::VeryLow => "very low",
            Self::BelowAverage => "below average",
            Self::AroundAverage => "around average",
            Self::AboveAverage => "above average",
            Self::ModeratelyHigh => "moderately high",
            Self::High => "high",
            Self::VeryHigh => "very high",
            Self::UnusuallyHigh => "unusually high",
        };
        write!(f, "{label}")
    }
}
