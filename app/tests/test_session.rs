//! FILENAME: tests/test_session.rs
//! Integration tests for the pivot session: load lifecycle, view state, export.

mod common;

use std::io::Cursor;

use app_lib::{LoadState, ReportSession, SessionError};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::NaiveDate;
use common::{test_config, Reply, ScriptedSource, FUEL_JSON};
use pivot_engine::{MetricType, PivotCellValue, SortColumn};

fn export_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

// ============================================================================
// LOAD LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_load_transitions_to_ready() {
    let source = ScriptedSource::fixtures();
    let mut session = ReportSession::new(source.clone(), &test_config());
    assert_eq!(session.state(), &LoadState::Idle);
    assert!(session.render().is_none());

    let state = session.load(false).await.clone();
    assert_eq!(state, LoadState::Ready { rows: 3 });
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_cached_rows_are_reused_until_reload() {
    let source = ScriptedSource::fixtures();
    let mut session = ReportSession::new(source.clone(), &test_config());

    session.load(false).await;
    session.load(false).await;
    assert_eq!(source.calls(), 1);

    session.load(true).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_reload_replaces_rows_wholesale() {
    let smaller = r#"[{"fuel": "EV", "makers": [{"name": "Z", "periodValues": {"MAR24": 9}}]}]"#;
    let source = ScriptedSource::new(vec![Reply::Body(FUEL_JSON.to_string()), Reply::Body(smaller.to_string())]);
    let mut session = ReportSession::new(source, &test_config());

    session.load(false).await;
    assert_eq!(session.load(true).await, &LoadState::Ready { rows: 1 });

    let model = session.render().unwrap();
    assert_eq!(model.rows.len(), 1);
    assert_eq!(model.rows[0].group_label, "EV");
    let keys: Vec<&str> = model.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["MAR24"]);
}

#[tokio::test]
async fn test_http_error_surfaces_as_failed_then_retry_succeeds() {
    let source = ScriptedSource::new(vec![Reply::Status(502), Reply::Body(String::new())]);
    let mut session = ReportSession::new(source.clone(), &test_config());

    match session.load(false).await {
        LoadState::Failed { message } => assert!(message.contains("502"), "{}", message),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(session.render().is_none());

    assert_eq!(session.retry().await, &LoadState::Ready { rows: 3 });
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_hung_fetch_times_out() {
    let source = ScriptedSource::new(vec![Reply::Hang]);
    let mut session = ReportSession::new(source, &test_config());

    match session.load(false).await {
        LoadState::Failed { message } => assert!(message.contains("no response within"), "{}", message),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_payload_fails() {
    let source = ScriptedSource::new(vec![Reply::Body(r#"{"unexpected": true}"#.to_string())]);
    let mut session = ReportSession::new(source, &test_config());

    assert!(matches!(session.load(false).await, LoadState::Failed { .. }));
}

// ============================================================================
// VIEW STATE
// ============================================================================

#[tokio::test]
async fn test_paging_is_clamped() {
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &test_config());
    session.load(false).await;

    assert_eq!(session.set_page(9), 2);
    let model = session.render().unwrap();
    assert_eq!(model.page, 2);
    assert_eq!(model.total_pages, 2);
    assert_eq!(model.rows.len(), 1);
    assert_eq!(model.rows[0].sub_label, "C");

    assert_eq!(session.set_page(0), 1);
}

#[tokio::test]
async fn test_search_and_sort_reset_page() {
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &test_config());
    session.load(false).await;
    session.set_page(2);

    session.set_search("PETROL");
    assert_eq!(session.request().page, 1);
    let model = session.render().unwrap();
    assert_eq!(model.total_rows, 2);

    session.set_page(2);
    session.select_sort_column(SortColumn::Period("FULL24".to_string()));
    session.select_sort_column(SortColumn::Period("FULL24".to_string()));
    assert_eq!(session.request().page, 1);
    let model = session.render().unwrap();
    let subs: Vec<&str> = model.rows.iter().map(|r| r.sub_label.as_str()).collect();
    assert_eq!(subs, vec!["A", "B"]);
}

#[tokio::test]
async fn test_year_filter_and_yoy_columns() {
    let mut config = test_config();
    config.per_page = 10;
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &config);
    session.load(false).await;

    session.set_selected_years([2024].into_iter().collect());
    session.set_include_yoy(true);
    let model = session.render().unwrap();

    let keys: Vec<&str> = model.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["FULL24", "JAN24", "FEB24", "FULL24_YOY"]);
    assert_eq!(model.rows[0].cells[3], PivotCellValue::Text("25.0%".to_string()));
    assert_eq!(model.rows[1].cells[3], PivotCellValue::Text(String::new()));
    assert_eq!(model.rows[2].cells[0], PivotCellValue::Number(0.0));
}

#[tokio::test]
async fn test_switching_metric_resets_filter() {
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &test_config());
    session.load(false).await;
    session.set_search("diesel");

    session.set_metric(MetricType::MakerVsVehicleClass);
    session.load(false).await;
    let model = session.render().unwrap();
    assert_eq!(model.total_rows, 2);
    assert!(model.rows.iter().all(|r| r.group_label == "TATA"));
}

// ============================================================================
// EXPORT
// ============================================================================

#[tokio::test]
async fn test_export_covers_all_filtered_rows() {
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &test_config());
    session.load(false).await;
    session.set_selected_years([2024, 2023].into_iter().collect());

    let report = session.export(export_date()).unwrap();
    assert_eq!(report.sheet_names, vec!["PETROL".to_string(), "DIESEL".to_string()]);
    assert_eq!(report.file_name, "Test_MakerVsFuelReport_2023_2024_2024-06-30.xlsx");
    assert!(!report.bytes.is_empty());

    session.set_search("diesel");
    let report = session.export(export_date()).unwrap();
    assert_eq!(report.sheet_names, vec!["DIESEL".to_string()]);
}

#[tokio::test]
async fn test_export_columns_match_screen_under_search() {
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &test_config());
    session.load(false).await;
    session.set_include_yoy(true);
    session.set_search("diesel");

    let model = session.render().unwrap();
    let screen: Vec<String> = model.columns.iter().map(|c| c.key.clone()).collect();
    assert_eq!(screen, vec!["FULL23", "FULL24", "JAN24", "FEB24", "FULL23_YOY", "FULL24_YOY"]);

    let report = session.export(export_date()).unwrap();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(report.bytes)).unwrap();
    let range = workbook.worksheet_range("DIESEL").unwrap();
    let header: Vec<String> = range
        .rows()
        .next()
        .unwrap()
        .iter()
        .skip(2)
        .map(|cell| match cell {
            Data::String(s) => s.clone(),
            other => panic!("unexpected header cell {:?}", other),
        })
        .collect();
    assert_eq!(header, screen);

    let first_row: Vec<Data> = range.rows().nth(1).unwrap().to_vec();
    assert_eq!(first_row[1], Data::String("C".to_string()));
    assert_eq!(first_row[3], Data::Float(0.0));
}

#[tokio::test]
async fn test_export_with_no_matching_rows_is_rejected() {
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &test_config());
    session.load(false).await;
    session.set_search("hydrogen");

    let err = session.export(export_date()).unwrap_err();
    assert!(matches!(err, SessionError::NothingToExport));
    assert_eq!(err.to_string(), "Nothing to export: no rows match the current filter");
}

#[tokio::test]
async fn test_saved_report_lands_in_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = ReportSession::new(ScriptedSource::fixtures(), &test_config());
    session.load(false).await;

    let report = session.export(export_date()).unwrap();
    let path = report_export::save_report(&report, dir.path()).unwrap();
    assert!(path.exists());
    assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, report.bytes.len());
}
