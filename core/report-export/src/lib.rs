//! FILENAME: core/report-export/src/lib.rs
//! Report Export Module
//!
//! Writes pivoted registration statistics to a multi-sheet XLSX workbook:
//! one sheet per top-level group, columns matching the on-screen pivot.

mod error;
mod sheet_name;
mod xlsx_writer;

pub use error::ExportError;
pub use sheet_name::{sanitize_sheet_name, SheetNamer, MAX_SHEET_NAME_CHARS};
pub use xlsx_writer::{export_report, save_report};

use std::collections::BTreeSet;

use chrono::NaiveDate;
use pivot_engine::{MetricType, PeriodToken, TimeSeriesRow};

/// Default file name prefix for generated reports.
pub const DEFAULT_REPORT_PREFIX: &str = "RegistrationStats";

// ============================================================================
// EXPORT REQUEST / RESULT
// ============================================================================

/// Naming parameters of one export. The period columns are passed to
/// [`export_report`] separately, as rendered on screen.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub metric: MetricType,
    /// Years listed in the file name; empty means all years.
    pub selected_years: BTreeSet<i32>,
    pub report_prefix: String,
    /// Date stamped into the file name.
    pub date: NaiveDate,
}

impl ExportRequest {
    pub fn new(metric: MetricType, date: NaiveDate) -> Self {
        Self {
            metric,
            selected_years: BTreeSet::new(),
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            date,
        }
    }
}

/// A finished workbook, ready to download or save.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Sheet names in workbook order.
    pub sheet_names: Vec<String>,
    /// Tokens left out of the columns because they did not parse.
    pub skipped_tokens: Vec<PeriodToken>,
}

// ============================================================================
// GROUPING
// ============================================================================

/// Rows sharing one `group_label`; becomes one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportGroup<'a> {
    pub label: &'a str,
    pub rows: Vec<&'a TimeSeriesRow>,
}

/// Buckets rows by group label, groups in first-seen order, rows in input
/// order within each group. Rows of one group need not be adjacent.
pub fn group_rows(rows: &[TimeSeriesRow]) -> Vec<ExportGroup<'_>> {
    let mut groups: Vec<ExportGroup<'_>> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|g| g.label == row.group_label) {
            Some(group) => group.rows.push(row),
            None => groups.push(ExportGroup {
                label: &row.group_label,
                rows: vec![row],
            }),
        }
    }
    groups
}

// ============================================================================
// FILE NAME
// ============================================================================

/// `<Prefix>_<MetricSuffix>Report[_<year>...]_<YYYY-MM-DD>.xlsx`
pub fn report_file_name(
    prefix: &str,
    metric: MetricType,
    selected_years: &BTreeSet<i32>,
    date: NaiveDate,
) -> String {
    let mut name = format!("{}_{}Report", prefix, metric.report_suffix());
    for year in selected_years {
        name.push('_');
        name.push_str(&year.to_string());
    }
    name.push('_');
    name.push_str(&date.format("%Y-%m-%d").to_string());
    name.push_str(".xlsx");
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 9).unwrap()
    }

    #[test]
    fn test_file_name_without_years() {
        assert_eq!(
            report_file_name("RegistrationStats", MetricType::MakerVsVehicleClass, &BTreeSet::new(), date()),
            "RegistrationStats_MakerVsVehicleClassReport_2026-01-09.xlsx"
        );
    }

    #[test]
    fn test_file_name_years_ascending() {
        let years: BTreeSet<i32> = [2025, 2023].into_iter().collect();
        assert_eq!(
            report_file_name("Vahan", MetricType::MakerVsFuel, &years, date()),
            "Vahan_MakerVsFuelReport_2023_2025_2026-01-09.xlsx"
        );
    }

    #[test]
    fn test_group_rows_first_seen_order() {
        let rows = vec![
            TimeSeriesRow::new("DIESEL", 2, "C"),
            TimeSeriesRow::new("PETROL", 1, "A"),
            TimeSeriesRow::new("DIESEL", 2, "D"),
        ];
        let groups = group_rows(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "DIESEL");
        assert_eq!(
            groups[0].rows.iter().map(|r| r.sub_label.as_str()).collect::<Vec<_>>(),
            vec!["C", "D"]
        );
        assert_eq!(groups[1].label, "PETROL");
    }

    #[test]
    fn test_export_request_defaults() {
        let request = ExportRequest::new(MetricType::MakerVsFuel, date());
        assert!(request.selected_years.is_empty());
        assert_eq!(request.report_prefix, DEFAULT_REPORT_PREFIX);
    }
}
