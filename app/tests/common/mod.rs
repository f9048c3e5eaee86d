//! FILENAME: tests/common/mod.rs
//! Fake hierarchy sources and fixtures for session integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_lib::{DashboardConfig, FetchError, HierarchySource};
use pivot_engine::{Hierarchy, MetricType};

/// Fuel hierarchy: PETROL (A, B) and DIESEL (C).
pub const FUEL_JSON: &str = r#"[
    {"fuel": "PETROL", "makers": [
        {"name": "A", "periodValues": {"JAN24": 5, "FULL23": 40, "FULL24": 50, "FULL24_YOY": 25.0}},
        {"name": "B", "periodValues": {"FEB24": 3, "FULL24": 30}}
    ]},
    {"fuel": "DIESEL", "makers": [
        {"name": "C", "periodValues": {"JAN24": 2, "FULL23": 10}}
    ]}
]"#;

/// Vehicle-class hierarchy with one maker.
pub const MAKER_JSON: &str = r#"[
    {"maker": "TATA", "categories": [
        {"name": "LMV", "periodValues": {"JAN24": 11}},
        {"name": "HGV", "periodValues": {"JAN24": 4}}
    ]}
]"#;

/// What the next fetch should do.
#[derive(Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
    Hang,
}

/// Scripted source: replies are consumed in order; the last one repeats.
#[derive(Clone)]
pub struct ScriptedSource {
    replies: Arc<Mutex<Vec<Reply>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(replies: Vec<Reply>) -> Self {
        ScriptedSource {
            replies: Arc::new(Mutex::new(replies)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fixtures() -> Self {
        Self::new(vec![Reply::Body(String::new())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        }
    }
}

impl HierarchySource for ScriptedSource {
    async fn fetch_hierarchy(&self, metric: MetricType) -> Result<Hierarchy, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_reply() {
            // Empty body means "the canned fixture for this metric".
            Reply::Body(body) if body.is_empty() => {
                let fixture = match metric {
                    MetricType::MakerVsFuel => FUEL_JSON,
                    MetricType::MakerVsVehicleClass => MAKER_JSON,
                };
                Ok(Hierarchy::from_json(metric, fixture)?)
            }
            Reply::Body(body) => Ok(Hierarchy::from_json(metric, &body)?),
            Reply::Status(status) => Err(FetchError::Status {
                status,
                url: format!("test://metrics/hierarchy?metric_type={}", metric.query_value()),
            }),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("the session timeout fires first")
            }
        }
    }
}

/// Config with a short timeout and small pages.
pub fn test_config() -> DashboardConfig {
    DashboardConfig {
        request_timeout_secs: 1,
        per_page: 2,
        report_prefix: "Test".to_string(),
        ..Default::default()
    }
}
