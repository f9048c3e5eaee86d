//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - filtering, sorting, paging and the render model.
//!
//! Everything here is a pure function of its inputs. The render model is
//! what a grid front end draws:
//! - Ordered period columns (with YoY pseudo-columns)
//! - One page of rows with their cells defaulted
//! - Group-start markers so repeated group labels can be suppressed

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::columns::{column_cell, ColumnSet, PivotCellValue, PivotColumn};
use crate::definition::{FilterSortState, GroupId, SortColumn, SortDirection, TimeSeriesRow};
use crate::period::PeriodToken;

// ============================================================================
// FILTER / SORT
// ============================================================================

/// True when the group or sub label contains `needle` (already lowercased).
fn row_matches(row: &TimeSeriesRow, needle: &str) -> bool {
    row.group_label.to_lowercase().contains(needle) || row.sub_label.to_lowercase().contains(needle)
}

/// Case-insensitive substring filter over both labels. Empty text keeps all.
pub fn filter_rows(rows: &[TimeSeriesRow], search_text: &str) -> Vec<TimeSeriesRow> {
    if search_text.is_empty() {
        return rows.to_vec();
    }
    let needle = search_text.to_lowercase();
    rows.iter()
        .filter(|row| row_matches(row, &needle))
        .cloned()
        .collect()
}

fn compare_rows(a: &TimeSeriesRow, b: &TimeSeriesRow, column: &SortColumn) -> Ordering {
    match column {
        SortColumn::GroupLabel => a.group_label.cmp(&b.group_label),
        SortColumn::SubLabel => a.sub_label.cmp(&b.sub_label),
        SortColumn::Period(token) => a.period_value(token).total_cmp(&b.period_value(token)),
    }
}

/// Stable sort on one column. Missing period values compare as zero.
pub fn sort_rows(rows: &mut [TimeSeriesRow], column: &SortColumn, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ordering = compare_rows(a, b, column);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Filters then sorts. Without a sort column, hierarchy order is kept.
pub fn apply(rows: &[TimeSeriesRow], state: &FilterSortState) -> Vec<TimeSeriesRow> {
    let mut result = filter_rows(rows, &state.search_text);
    if let Some(column) = &state.sort_column {
        sort_rows(&mut result, column, state.sort_direction);
    }
    result
}

// ============================================================================
// PAGINATION
// ============================================================================

/// One page of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice<'a> {
    pub rows: &'a [TimeSeriesRow],
    pub total_pages: usize,
}

/// `ceil(len / per_page)`, never less than one.
pub fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    len.div_ceil(per_page).max(1)
}

/// Slices out 1-based `page`. Callers clamp first (see [`clamp_page`]);
/// an out-of-range page yields an empty slice rather than an error.
pub fn paginate(rows: &[TimeSeriesRow], page: usize, per_page: usize) -> PageSlice<'_> {
    let total = total_pages(rows.len(), per_page);
    if page == 0 || per_page == 0 {
        return PageSlice { rows: &[], total_pages: total };
    }

    let start = (page - 1).saturating_mul(per_page);
    if start >= rows.len() {
        return PageSlice { rows: &[], total_pages: total };
    }
    let end = start.saturating_add(per_page).min(rows.len());

    PageSlice {
        rows: &rows[start..end],
        total_pages: total,
    }
}

/// Clamps a requested page into `[1, total_pages]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

// ============================================================================
// RENDER MODEL
// ============================================================================

/// A row as drawn by the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRow {
    pub group_id: GroupId,
    pub group_label: String,
    pub sub_label: String,

    /// First row of the page, or the group changed from the row above.
    /// Renderers print `group_label` only on these rows.
    pub is_group_start: bool,

    /// One cell per column, in column order.
    pub cells: Vec<PivotCellValue>,
}

/// Everything a presentation layer needs for one screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderModel {
    pub columns: Vec<PivotColumn>,
    pub rows: Vec<RenderRow>,
    pub page: usize,
    pub total_pages: usize,

    /// Rows after filtering, across all pages.
    pub total_rows: usize,

    /// Period tokens excluded from the column set because they did not parse.
    pub skipped_tokens: Vec<PeriodToken>,
}

/// Builds render rows for one page against a column set.
pub fn render_rows(page_rows: &[TimeSeriesRow], columns: &[PivotColumn]) -> Vec<RenderRow> {
    let mut previous: Option<GroupId> = None;
    page_rows
        .iter()
        .map(|row| {
            let is_group_start = previous != Some(row.group_id);
            previous = Some(row.group_id);
            RenderRow {
                group_id: row.group_id,
                group_label: row.group_label.clone(),
                sub_label: row.sub_label.clone(),
                is_group_start,
                cells: columns.iter().map(|c| column_cell(row, c)).collect(),
            }
        })
        .collect()
}

/// Assembles the render model from already filtered/sorted rows.
pub fn build_render_model(
    visible_rows: &[TimeSeriesRow],
    column_set: &ColumnSet,
    page: usize,
    per_page: usize,
) -> RenderModel {
    let slice = paginate(visible_rows, page, per_page);
    RenderModel {
        columns: column_set.columns.clone(),
        rows: render_rows(slice.rows, &column_set.columns),
        page,
        total_pages: slice.total_pages,
        total_rows: visible_rows.len(),
        skipped_tokens: column_set.skipped_tokens.clone(),
    }
}
