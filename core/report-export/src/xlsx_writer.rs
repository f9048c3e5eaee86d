//! FILENAME: core/report-export/src/xlsx_writer.rs

use std::path::{Path, PathBuf};

use pivot_engine::{column_cell, ColumnSet, PivotCellValue, PivotColumn, TimeSeriesRow};
use rust_xlsxwriter::{Format, FormatAlign, Workbook as XlsxWorkbook, Worksheet};

use crate::sheet_name::SheetNamer;
use crate::{group_rows, report_file_name, ExportError, ExportRequest, ExportedReport};

const LABEL_COLUMN_WIDTH: f64 = 28.0;
const PERIOD_COLUMN_WIDTH: f64 = 11.0;

/// Builds the report workbook: one sheet per group label, in first-seen order.
///
/// Every sheet carries `column_set`, which callers take from the on-screen
/// pivot so the download shows exactly the columns the user sees.
pub fn export_report(
    rows: &[TimeSeriesRow],
    column_set: &ColumnSet,
    request: &ExportRequest,
) -> Result<ExportedReport, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::EmptyExport);
    }

    let (first_header, second_header) = request.metric.label_headers();
    let header_format = Format::new().set_bold();
    let percent_format = Format::new().set_align(FormatAlign::Right);

    let mut xlsx = XlsxWorkbook::new();
    let mut namer = SheetNamer::new();
    let mut sheet_names = Vec::new();

    for group in group_rows(rows) {
        let name = namer.assign(&group.label);
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&name)?;

        write_header(worksheet, first_header, second_header, &column_set.columns, &header_format)?;

        for (i, row) in group.rows.iter().enumerate() {
            let xl_row = (i + 1) as u32;
            worksheet.write_string(xl_row, 0, &row.group_label)?;
            worksheet.write_string(xl_row, 1, &row.sub_label)?;

            for (c, column) in column_set.columns.iter().enumerate() {
                let xl_col = (c + 2) as u16;
                match column_cell(row, column) {
                    PivotCellValue::Number(n) => {
                        worksheet.write_number(xl_row, xl_col, n)?;
                    }
                    // Missing YoY: leave the cell blank.
                    PivotCellValue::Text(s) if s.is_empty() => {}
                    PivotCellValue::Text(s) => {
                        worksheet.write_string_with_format(xl_row, xl_col, &s, &percent_format)?;
                    }
                }
            }
        }

        sheet_names.push(name);
    }

    let bytes = xlsx.save_to_buffer()?;
    let file_name = report_file_name(&request.report_prefix, request.metric, &request.selected_years, request.date);

    log::info!(
        target: "EXPORT",
        "built {} sheets={} rows={} columns={} bytes={}",
        file_name,
        sheet_names.len(),
        rows.len(),
        column_set.len(),
        bytes.len()
    );

    Ok(ExportedReport {
        file_name,
        bytes,
        sheet_names,
        skipped_tokens: column_set.skipped_tokens.clone(),
    })
}

fn write_header(
    worksheet: &mut Worksheet,
    first_header: &str,
    second_header: &str,
    columns: &[PivotColumn],
    format: &Format,
) -> Result<(), ExportError> {
    worksheet.write_string_with_format(0, 0, first_header, format)?;
    worksheet.write_string_with_format(0, 1, second_header, format)?;
    worksheet.set_column_width(0, LABEL_COLUMN_WIDTH)?;
    worksheet.set_column_width(1, LABEL_COLUMN_WIDTH)?;

    for (c, column) in columns.iter().enumerate() {
        let xl_col = (c + 2) as u16;
        worksheet.write_string_with_format(0, xl_col, &column.key, format)?;
        worksheet.set_column_width(xl_col, PERIOD_COLUMN_WIDTH)?;
    }

    worksheet.set_freeze_panes(1, 2)?;
    Ok(())
}

/// Writes the report into `dir` under its generated file name.
pub fn save_report(report: &ExportedReport, dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&report.file_name);
    std::fs::write(&path, &report.bytes)?;
    log::info!(target: "EXPORT", "saved {:?}", path);
    Ok(path)
}
