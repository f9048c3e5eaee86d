//! FILENAME: core/pivot-engine/src/period.rs
//! Period keys - canonical ordering for raw period tokens.
//!
//! Upstream data labels each value with a token such as `JAN24`, `FULL24`
//! or `2024`. This module turns those tokens into a `PeriodKey` that sorts
//! chronologically, with the full-year aggregate ahead of January.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw period key as it appears in the hierarchy payload.
pub type PeriodToken = String;

/// Suffix marking a derived year-over-year field (`FULL24_YOY`).
pub const YOY_SUFFIX: &str = "_YOY";

/// Month index reserved for full-year aggregates.
pub const FULL_YEAR_MONTH: u8 = 0;

const MONTHS: [(&str, u8); 12] = [
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MAY", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AUG", 8),
    ("SEP", 9),
    ("OCT", 10),
    ("NOV", 11),
    ("DEC", 12),
];

static MONTH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{3})(\d{2})$").expect("month token pattern"));
static FULL_YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^FULL(\d{2})$").expect("full-year token pattern"));
static BARE_YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})$").expect("bare year pattern"));

// ============================================================================
// PERIOD KEY
// ============================================================================

/// Canonical sort key for a period token.
///
/// Field order matters: the derived `Ord` compares `year` first, then
/// `month`, so `FULL24` (month 0) lands before `JAN24` (month 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    /// 1..=12 for calendar months, 0 for the full-year aggregate.
    pub month: u8,
}

impl PeriodKey {
    pub fn month(year: i32, month: u8) -> Self {
        PeriodKey { year, month }
    }

    pub fn full_year(year: i32) -> Self {
        PeriodKey { year, month: FULL_YEAR_MONTH }
    }

    pub fn is_full_year(&self) -> bool {
        self.month == FULL_YEAR_MONTH
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodParseError {
    #[error("unrecognized period token: {0:?}")]
    UnrecognizedToken(String),

    #[error("unknown month prefix {prefix:?} in period token {token:?}")]
    UnknownMonth { token: String, prefix: String },
}

// ============================================================================
// PARSING
// ============================================================================

/// Parses a raw period token.
///
/// Two-digit years always map into the 2000s. Tokens are matched exactly:
/// no trimming and no case folding.
pub fn parse_period(token: &str) -> Result<PeriodKey, PeriodParseError> {
    if let Some(caps) = FULL_YEAR_TOKEN.captures(token) {
        return Ok(PeriodKey::full_year(two_digit_year(&caps[1])));
    }

    if let Some(caps) = BARE_YEAR_TOKEN.captures(token) {
        let year = caps[1]
            .parse::<i32>()
            .map_err(|_| PeriodParseError::UnrecognizedToken(token.to_string()))?;
        return Ok(PeriodKey::full_year(year));
    }

    if let Some(caps) = MONTH_TOKEN.captures(token) {
        let prefix = &caps[1];
        let month = month_index(prefix).ok_or_else(|| PeriodParseError::UnknownMonth {
            token: token.to_string(),
            prefix: prefix.to_string(),
        })?;
        return Ok(PeriodKey::month(two_digit_year(&caps[2]), month));
    }

    Err(PeriodParseError::UnrecognizedToken(token.to_string()))
}

fn two_digit_year(digits: &str) -> i32 {
    // The patterns only let two ASCII digits through.
    2000 + digits.parse::<i32>().unwrap_or(0)
}

fn month_index(prefix: &str) -> Option<u8> {
    MONTHS
        .iter()
        .find(|(name, _)| *name == prefix)
        .map(|(_, index)| *index)
}

// ============================================================================
// YOY KEYS
// ============================================================================

/// True for derived `<token>_YOY` keys.
pub fn is_yoy_key(key: &str) -> bool {
    key.len() > YOY_SUFFIX.len() && key.ends_with(YOY_SUFFIX)
}

/// The derived year-over-year key for a full-year token.
pub fn yoy_key(token: &str) -> String {
    format!("{}{}", token, YOY_SUFFIX)
}
