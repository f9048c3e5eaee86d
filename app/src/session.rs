//! FILENAME: app/src/session.rs
// PURPOSE: One user's pivot session: metric selection, load lifecycle,
//          transient filter/sort/page state, rendering and export.
// CONTEXT: The fetch is the only suspension point. Every fetch is bounded by
//          a timeout so `Loading` always resolves to `Ready` or `Failed`.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDate;
use pivot_engine::{
    clamp_page, total_pages, FilterSortState, MemoryRowCache, MetricType, PivotEngine, PivotRequest,
    RenderModel, RowCache, SortColumn,
};
use report_export::{export_report, ExportError, ExportRequest, ExportedReport};
use serde::Serialize;
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::fetch::{FetchError, HierarchySource};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{metric} is not loaded")]
    NotLoaded { metric: MetricType },

    #[error("Nothing to export: no rows match the current filter")]
    NothingToExport,

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Load lifecycle of the current metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LoadState {
    Idle,
    Loading,
    Ready { rows: usize },
    /// Retryable through [`ReportSession::retry`].
    Failed { message: String },
}

pub struct ReportSession<S: HierarchySource, C: RowCache = MemoryRowCache> {
    source: S,
    engine: PivotEngine<C>,
    metric: MetricType,
    state: LoadState,
    request: PivotRequest,
    fetch_timeout: Duration,
    report_prefix: String,
}

impl<S: HierarchySource> ReportSession<S, MemoryRowCache> {
    pub fn new(source: S, config: &DashboardConfig) -> Self {
        Self::with_cache(source, MemoryRowCache::new(), config)
    }
}

impl<S: HierarchySource, C: RowCache> ReportSession<S, C> {
    pub fn with_cache(source: S, cache: C, config: &DashboardConfig) -> Self {
        ReportSession {
            source,
            engine: PivotEngine::new(cache),
            metric: MetricType::MakerVsFuel,
            state: LoadState::Idle,
            request: PivotRequest {
                per_page: config.per_page,
                ..Default::default()
            },
            fetch_timeout: config.request_timeout(),
            report_prefix: config.report_prefix.clone(),
        }
    }

    pub fn metric(&self) -> MetricType {
        self.metric
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn request(&self) -> &PivotRequest {
        &self.request
    }

    // ========================================================================
    // METRIC + LOADING
    // ========================================================================

    /// Switches metric. Filter, sort and page go back to defaults; year
    /// selection, YoY flag and page size are kept.
    pub fn set_metric(&mut self, metric: MetricType) {
        if metric == self.metric {
            return;
        }
        log::info!(target: "SESSION", "metric {} -> {}", self.metric, metric);
        self.metric = metric;
        self.request.filter_sort = FilterSortState::default();
        self.request.page = 1;
        self.state = match self.engine.rows(metric) {
            Some(rows) => LoadState::Ready { rows: rows.len() },
            None => LoadState::Idle,
        };
    }

    /// Loads the current metric. Cached rows are reused unless `reload`.
    pub async fn load(&mut self, reload: bool) -> &LoadState {
        let metric = self.metric;

        if reload {
            self.engine.invalidate(metric);
        } else if let Some(rows) = self.engine.rows(metric) {
            self.state = LoadState::Ready { rows: rows.len() };
            return &self.state;
        }

        self.state = LoadState::Loading;
        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch_hierarchy(metric)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };

        self.state = match fetched {
            Ok(hierarchy) => {
                let rows = self.engine.ingest(&hierarchy);
                self.clamp_current_page();
                LoadState::Ready { rows: rows.len() }
            }
            Err(e) => {
                log::error!(target: "SESSION", "load metric={} failed: {}", metric, e);
                LoadState::Failed { message: e.to_string() }
            }
        };
        &self.state
    }

    /// Retry after a failure (or force a refresh).
    pub async fn retry(&mut self) -> &LoadState {
        self.load(true).await
    }

    // ========================================================================
    // VIEW STATE
    // ========================================================================

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.request.filter_sort.search_text = text.into();
        self.request.page = 1;
    }

    /// Header click: new column ascending, same column toggles.
    pub fn select_sort_column(&mut self, column: SortColumn) {
        self.request.filter_sort.select_sort_column(column);
        self.request.page = 1;
    }

    pub fn set_selected_years(&mut self, years: BTreeSet<i32>) {
        self.request.selected_years = years;
        self.request.page = 1;
    }

    pub fn set_include_yoy(&mut self, include_yoy: bool) {
        self.request.include_yoy = include_yoy;
    }

    /// Moves to `page`, clamped to the pages that exist right now.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.request.page = page;
        self.clamp_current_page();
        self.request.page
    }

    fn clamp_current_page(&mut self) {
        let visible = self
            .engine
            .visible_rows(self.metric, &self.request.filter_sort)
            .map(|rows| rows.len())
            .unwrap_or(0);
        let pages = total_pages(visible, self.request.per_page);
        self.request.page = clamp_page(self.request.page, pages);
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    /// Render model for the current state; `None` until rows are loaded.
    pub fn render(&self) -> Option<RenderModel> {
        self.engine.render(self.metric, &self.request)
    }

    /// Exports every row matching the current filter (all pages), with the
    /// same period columns `render` shows.
    pub fn export(&self, date: NaiveDate) -> Result<ExportedReport, SessionError> {
        let not_loaded = || SessionError::NotLoaded { metric: self.metric };
        let columns = self
            .engine
            .columns(self.metric, &self.request)
            .ok_or_else(not_loaded)?;
        let rows = self
            .engine
            .visible_rows(self.metric, &self.request.filter_sort)
            .ok_or_else(not_loaded)?;

        if rows.is_empty() {
            log::warn!(target: "SESSION", "export rejected: no rows for metric={}", self.metric);
            return Err(SessionError::NothingToExport);
        }

        let request = ExportRequest {
            metric: self.metric,
            selected_years: self.request.selected_years.clone(),
            report_prefix: self.report_prefix.clone(),
            date,
        };
        Ok(export_report(&rows, &columns, &request)?)
    }
}
