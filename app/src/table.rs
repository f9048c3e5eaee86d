//! FILENAME: app/src/table.rs
// PURPOSE: Plain-text rendering of a RenderModel for the terminal.

use pivot_engine::{PivotCellValue, RenderModel};

const MAX_LABEL_WIDTH: usize = 32;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}

fn cell_text(cell: &PivotCellValue) -> String {
    match cell {
        PivotCellValue::Number(n) if n.fract() == 0.0 => format!("{:.0}", n),
        other => other.display(),
    }
}

/// Renders one page as an aligned text table. Group labels are printed only
/// on the first row of each group run.
pub fn format_table(model: &RenderModel, group_header: &str, sub_header: &str) -> String {
    let mut header: Vec<String> = vec![group_header.to_string(), sub_header.to_string()];
    header.extend(model.columns.iter().map(|c| c.key.clone()));

    let body: Vec<Vec<String>> = model
        .rows
        .iter()
        .map(|row| {
            let group = if row.is_group_start {
                clip(&row.group_label, MAX_LABEL_WIDTH)
            } else {
                String::new()
            };
            let mut line = vec![group, clip(&row.sub_label, MAX_LABEL_WIDTH)];
            line.extend(row.cells.iter().map(cell_text));
            line
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in &body {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render_line = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i < 2 {
                    format!("{:<width$}", cell, width = widths[i])
                } else {
                    format!("{:>width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render_line(&header));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.push('\n');
    for line in &body {
        out.push_str(&render_line(line));
        out.push('\n');
    }
    out.push_str(&format!(
        "page {}/{} ({} rows)\n",
        model.page, model.total_pages, model.total_rows
    ));
    if !model.skipped_tokens.is_empty() {
        out.push_str(&format!("skipped period tokens: {}\n", model.skipped_tokens.join(", ")));
    }
    out
}
