//! Money in integer micros plus the derived ratios (CPA, CTR, CPC).
//!
//! Costs are carried as `i64` micros of account currency end to end. Only the
//! ratios are floating point, and a ratio with a zero denominator is
//! [`Metric::NotApplicable`] instead of NaN or infinity.

use std::fmt;

use serde::{Serialize, Serializer};

pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// Largest amount accepted for a single input row: one billion units.
pub const MAX_ROW_AMOUNT_MICROS: i64 = 1_000_000_000 * MICROS_PER_UNIT;

const MICROS_DIGITS: usize = 6;

/// Convert a currency amount from configuration or flags into micros.
pub fn units_to_micros(units: f64) -> i64 {
    (units * MICROS_PER_UNIT as f64).round() as i64
}

pub fn micros_to_units(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT as f64
}

// ---------------------------------------------------------------------------
// Parsing (string-to-micros, no f64)
// ---------------------------------------------------------------------------

/// Parse a decimal amount string to i64 micros.
/// Handles "1234.56", "1,234.5", "$12", "-0.25" and up to six decimals.
pub fn parse_money_micros(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let negative = s.starts_with('-');
    let s = s.trim_start_matches('-').trim_start_matches('$');
    let s: String = s.chars().filter(|c| *c != ',').collect();
    if s.is_empty() {
        return Err("empty amount".into());
    }

    let (whole, frac) = match s.find('.') {
        Some(dot) => (&s[..dot], &s[dot + 1..]),
        None => (s.as_str(), ""),
    };
    if frac.len() > MICROS_DIGITS {
        return Err(format!("too many decimal places: {s}"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(format!("bad amount: {s}"));
    }

    let units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|e| format!("bad amount: {e}"))?
    };
    let fraction: i64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = MICROS_DIGITS);
        padded.parse().map_err(|e| format!("bad fraction: {e}"))?
    };

    let micros = units
        .checked_mul(MICROS_PER_UNIT)
        .and_then(|m| m.checked_add(fraction))
        .ok_or_else(|| format!("amount out of range: {s}"))?;
    Ok(if negative { -micros } else { micros })
}

/// Render micros as a two-decimal amount, rounding half away from zero.
pub fn format_micros(micros: i64) -> String {
    let cents_unit = MICROS_PER_UNIT / 100;
    let half = cents_unit / 2;
    let cents = if micros >= 0 {
        micros.saturating_add(half) / cents_unit
    } else {
        micros.saturating_sub(half) / cents_unit
    };
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Console form: `$1,234.56`.
pub fn format_currency(micros: i64) -> String {
    let plain = format_micros(micros);
    let (sign, rest) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (whole, frac) = rest.split_once('.').unwrap_or((rest, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{frac}")
}

// ---------------------------------------------------------------------------
// Derived ratios
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    /// The denominator was zero.
    NotApplicable,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotApplicable => None,
        }
    }

    pub fn is_applicable(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::NotApplicable => write!(f, "n/a"),
        }
    }
}

/// JSON: a number, or `null` when not applicable.
impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::NotApplicable => serializer.serialize_none(),
        }
    }
}

/// Cost per conversion, in currency units.
pub fn cpa(cost_micros: i64, conversions: f64) -> Metric {
    if conversions > 0.0 && conversions.is_finite() {
        Metric::Value(micros_to_units(cost_micros) / conversions)
    } else {
        Metric::NotApplicable
    }
}

/// Click-through rate as a percentage.
pub fn ctr(clicks: u64, impressions: u64) -> Metric {
    if impressions == 0 {
        return Metric::NotApplicable;
    }
    Metric::Value(clicks as f64 * 100.0 / impressions as f64)
}

/// Cost per click, in currency units.
pub fn cpc(cost_micros: i64, clicks: u64) -> Metric {
    if clicks == 0 {
        return Metric::NotApplicable;
    }
    Metric::Value(micros_to_units(cost_micros) / clicks as f64)
}

/// Share of `part` in `total` as a percentage; zero when `total` is zero.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
