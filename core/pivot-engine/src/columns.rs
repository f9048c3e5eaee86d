//! FILENAME: core/pivot-engine/src/columns.rs
//! Column set assembly for the period axis.
//!
//! Algorithm:
//! 1. Union the value keys of *every* row (rows are sparse, so sampling one
//!    row loses periods)
//! 2. Parse each key; unparseable keys are reported, not dropped silently.
//!    `<token>_YOY` keys are derived data and only accepted on full years
//! 3. Keep keys whose year is selected (no selection = all years)
//! 4. Sort by canonical (year, month)
//! 5. Optionally append one YoY column per full-year column

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::definition::TimeSeriesRow;
use crate::period::{is_yoy_key, parse_period, yoy_key, PeriodKey, PeriodParseError, PeriodToken, YOY_SUFFIX};

// ============================================================================
// COLUMN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Month,
    FullYear,
    /// Derived column holding the upstream YoY percentage of a full year.
    YearOverYear,
}

/// One rendered period column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotColumn {
    /// Header text; also the lookup key into `TimeSeriesRow::values`.
    pub key: PeriodToken,

    /// The period this column belongs to (for YoY columns, its full year).
    pub period: PeriodKey,

    pub kind: ColumnKind,
}

/// The ordered column list plus the tokens that could not be placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSet {
    pub columns: Vec<PivotColumn>,

    /// Keys that did not parse as period tokens, sorted. Kept for
    /// diagnosing upstream format drift.
    pub skipped_tokens: Vec<PeriodToken>,
}

impl ColumnSet {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Builds the column set over `rows`.
pub fn assemble_columns(
    rows: &[TimeSeriesRow],
    selected_years: &BTreeSet<i32>,
    include_yoy: bool,
) -> ColumnSet {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for row in rows {
        seen.extend(row.values.keys().map(String::as_str));
    }

    let mut periods: Vec<(PeriodKey, &str)> = Vec::with_capacity(seen.len());
    let mut skipped_tokens: Vec<PeriodToken> = Vec::new();

    for key in seen {
        if is_yoy_key(key) {
            if let Err(e) = check_yoy_key(key) {
                log::warn!(target: "PERIOD", "skipping derived key: {}", e);
                skipped_tokens.push(key.to_string());
            }
            continue;
        }
        match parse_period(key) {
            Ok(period) => {
                if selected_years.is_empty() || selected_years.contains(&period.year) {
                    periods.push((period, key));
                }
            }
            Err(e) => {
                log::warn!(target: "PERIOD", "skipping column: {}", e);
                skipped_tokens.push(key.to_string());
            }
        }
    }

    // Token breaks ties between equivalent spellings (FULL24 vs 2024).
    periods.sort_unstable();
    skipped_tokens.sort_unstable();

    let mut columns: Vec<PivotColumn> = periods
        .iter()
        .map(|(period, key)| PivotColumn {
            key: key.to_string(),
            period: *period,
            kind: if period.is_full_year() {
                ColumnKind::FullYear
            } else {
                ColumnKind::Month
            },
        })
        .collect();

    if include_yoy {
        let yoy_columns: Vec<PivotColumn> = columns
            .iter()
            .filter(|c| c.kind == ColumnKind::FullYear)
            .map(|c| PivotColumn {
                key: yoy_key(&c.key),
                period: c.period,
                kind: ColumnKind::YearOverYear,
            })
            .collect();
        columns.extend(yoy_columns);
    }

    ColumnSet {
        columns,
        skipped_tokens,
    }
}

/// A derived key is well formed when its base token is a full year.
fn check_yoy_key(key: &str) -> Result<(), PeriodParseError> {
    let base = &key[..key.len() - YOY_SUFFIX.len()];
    if parse_period(base)?.is_full_year() {
        Ok(())
    } else {
        Err(PeriodParseError::UnrecognizedToken(key.to_string()))
    }
}

// ============================================================================
// CELLS
// ============================================================================

/// A rendered cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PivotCellValue {
    Number(f64),
    Text(String),
}

impl PivotCellValue {
    /// Display string, as a grid renderer would show it.
    pub fn display(&self) -> String {
        match self {
            PivotCellValue::Number(n) => format!("{}", n),
            PivotCellValue::Text(s) => s.clone(),
        }
    }
}

/// Formats an upstream YoY percentage (`12.4` -> `"12.4%"`).
pub fn format_yoy(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Renders one row/column intersection. Missing counts are `0`; missing YoY
/// values are an empty string.
pub fn column_cell(row: &TimeSeriesRow, column: &PivotColumn) -> PivotCellValue {
    match column.kind {
        ColumnKind::Month | ColumnKind::FullYear => {
            PivotCellValue::Number(row.period_value(&column.key))
        }
        ColumnKind::YearOverYear => PivotCellValue::Text(
            row.values
                .get(&column.key)
                .map(|v| format_yoy(*v))
                .unwrap_or_default(),
        ),
    }
}
