//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - ties the row cache to the view pipeline.
//!
//! Algorithm:
//! 1. Flatten a fetched hierarchy and store the rows under its metric
//! 2. Assemble columns over ALL cached rows (not the filtered subset)
//! 3. Filter and sort the rows with the request's state
//! 4. Slice out the requested page and render its cells

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cache::{MemoryRowCache, RowCache, RowSnapshot};
use crate::columns::{assemble_columns, ColumnSet};
use crate::definition::{FilterSortState, MetricType, TimeSeriesRow};
use crate::hierarchy::{flatten, Hierarchy};
use crate::view::{apply, build_render_model, RenderModel};

/// Default rows per page.
pub const DEFAULT_PER_PAGE: usize = 15;

/// What the user currently asks to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRequest {
    pub filter_sort: FilterSortState,

    /// 1-based; expected to be clamped by the caller.
    pub page: usize,

    pub per_page: usize,

    /// Years to show. Empty means all years.
    pub selected_years: BTreeSet<i32>,

    pub include_yoy: bool,
}

impl Default for PivotRequest {
    fn default() -> Self {
        PivotRequest {
            filter_sort: FilterSortState::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            selected_years: BTreeSet::new(),
            include_yoy: false,
        }
    }
}

/// Column set for `rows` under the request's years and YoY flag.
fn request_columns(rows: &[TimeSeriesRow], request: &PivotRequest) -> ColumnSet {
    assemble_columns(rows, &request.selected_years, request.include_yoy)
}

/// Computes the render model for `rows`.
pub fn calculate_view(rows: &[TimeSeriesRow], request: &PivotRequest) -> RenderModel {
    let column_set = request_columns(rows, request);
    let visible = apply(rows, &request.filter_sort);
    build_render_model(&visible, &column_set, request.page, request.per_page)
}

// ============================================================================
// PIVOT ENGINE
// ============================================================================

/// Flattening plus a per-metric row cache.
pub struct PivotEngine<C: RowCache = MemoryRowCache> {
    cache: C,
}

impl PivotEngine<MemoryRowCache> {
    pub fn in_memory() -> Self {
        PivotEngine::new(MemoryRowCache::new())
    }
}

impl Default for PivotEngine<MemoryRowCache> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<C: RowCache> PivotEngine<C> {
    pub fn new(cache: C) -> Self {
        PivotEngine { cache }
    }

    /// Cached rows for `metric`, if loaded.
    pub fn rows(&self, metric: MetricType) -> Option<RowSnapshot> {
        self.cache.get(metric)
    }

    /// Flattens `hierarchy` and replaces the cache entry for its metric.
    pub fn ingest(&self, hierarchy: &Hierarchy) -> RowSnapshot {
        let rows: RowSnapshot = flatten(hierarchy).into();
        self.cache.put(hierarchy.metric, rows.clone());
        log::info!(
            target: "PIVOT",
            "ingested metric={} groups={} rows={}",
            hierarchy.metric,
            hierarchy.groups.len(),
            rows.len()
        );
        rows
    }

    /// Reload signal: the next load of `metric` must recompute.
    pub fn invalidate(&self, metric: MetricType) {
        self.cache.invalidate(metric);
    }

    /// Render model for the cached rows of `metric`, or `None` if not loaded.
    pub fn render(&self, metric: MetricType, request: &PivotRequest) -> Option<RenderModel> {
        let rows = self.cache.get(metric)?;
        let model = calculate_view(&rows, request);
        log::debug!(
            target: "PIVOT",
            "render metric={} page={}/{} visible={} columns={}",
            metric,
            model.page,
            model.total_pages,
            model.total_rows,
            model.columns.len()
        );
        Some(model)
    }

    /// The columns `render` shows for `metric`: assembled over every cached
    /// row, independent of the search filter. Exports reuse this set.
    pub fn columns(&self, metric: MetricType, request: &PivotRequest) -> Option<ColumnSet> {
        self.cache.get(metric).map(|rows| request_columns(&rows, request))
    }

    /// Filtered and sorted snapshot of every cached row (all pages), as
    /// handed to the exporter.
    pub fn visible_rows(&self, metric: MetricType, state: &FilterSortState) -> Option<Vec<TimeSeriesRow>> {
        self.cache.get(metric).map(|rows| apply(&rows, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::PivotCellValue;
    use crate::definition::SortColumn;

    fn create_test_hierarchy() -> Hierarchy {
        Hierarchy::from_json(
            MetricType::MakerVsFuel,
            r#"[
                {"fuel": "PETROL", "makers": [
                    {"name": "A", "periodValues": {"JAN24": 5, "FULL24": 50, "FULL24_YOY": 4.2}},
                    {"name": "B", "periodValues": {"FEB24": 3}}
                ]},
                {"fuel": "DIESEL", "makers": [
                    {"name": "C", "periodValues": {"JAN24": 2, "JAN23": 9}}
                ]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_render_requires_loaded_rows() {
        let engine = PivotEngine::in_memory();
        assert!(engine.render(MetricType::MakerVsFuel, &PivotRequest::default()).is_none());
    }

    #[test]
    fn test_basic_render() {
        let engine = PivotEngine::in_memory();
        engine.ingest(&create_test_hierarchy());

        let view = engine.render(MetricType::MakerVsFuel, &PivotRequest::default()).unwrap();
        let keys: Vec<&str> = view.columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["JAN23", "FULL24", "JAN24", "FEB24"]);
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.total_pages, 1);
        assert_eq!(
            view.rows[1].cells,
            vec![
                PivotCellValue::Number(0.0),
                PivotCellValue::Number(0.0),
                PivotCellValue::Number(0.0),
                PivotCellValue::Number(3.0),
            ]
        );
    }

    #[test]
    fn test_columns_come_from_all_rows_not_filtered_rows() {
        let engine = PivotEngine::in_memory();
        engine.ingest(&create_test_hierarchy());

        let request = PivotRequest {
            filter_sort: FilterSortState::with_search("diesel"),
            selected_years: [2024].into_iter().collect(),
            include_yoy: true,
            ..Default::default()
        };
        let view = engine.render(MetricType::MakerVsFuel, &request).unwrap();

        let keys: Vec<&str> = view.columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["FULL24", "JAN24", "FEB24", "FULL24_YOY"]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].sub_label, "C");
    }

    #[test]
    fn test_columns_match_rendered_columns_under_search() {
        let engine = PivotEngine::in_memory();
        engine.ingest(&create_test_hierarchy());

        let request = PivotRequest {
            filter_sort: FilterSortState::with_search("diesel"),
            include_yoy: true,
            ..Default::default()
        };
        let view = engine.render(MetricType::MakerVsFuel, &request).unwrap();
        let columns = engine.columns(MetricType::MakerVsFuel, &request).unwrap();

        assert_eq!(columns.columns, view.columns);
        assert_eq!(columns.keys(), vec!["JAN23", "FULL24", "JAN24", "FEB24", "FULL24_YOY"]);
        assert!(engine.columns(MetricType::MakerVsVehicleClass, &request).is_none());
    }

    #[test]
    fn test_reingest_replaces_rows() {
        let engine = PivotEngine::in_memory();
        engine.ingest(&create_test_hierarchy());

        let smaller = Hierarchy::from_json(
            MetricType::MakerVsFuel,
            r#"[{"fuel": "EV", "makers": [{"name": "Z", "periodValues": {"MAR24": 1}}]}]"#,
        )
        .unwrap();
        engine.ingest(&smaller);

        let rows = engine.rows(MetricType::MakerVsFuel).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group_label, "EV");

        engine.invalidate(MetricType::MakerVsFuel);
        assert!(engine.rows(MetricType::MakerVsFuel).is_none());
    }

    #[test]
    fn test_visible_rows_spans_all_pages() {
        let engine = PivotEngine::in_memory();
        engine.ingest(&create_test_hierarchy());

        let mut state = FilterSortState::default();
        state.select_sort_column(SortColumn::GroupLabel);
        let rows = engine.visible_rows(MetricType::MakerVsFuel, &state).unwrap();

        let groups: Vec<&str> = rows.iter().map(|r| r.group_label.as_str()).collect();
        assert_eq!(groups, vec!["DIESEL", "PETROL", "PETROL"]);
    }
}
