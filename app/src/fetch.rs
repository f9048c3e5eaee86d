//! FILENAME: app/src/fetch.rs
// PURPOSE: Loading the metric hierarchy from the metrics API.
// CONTEXT: Authentication is the caller's business: the HTTP source takes a
//          pre-built reqwest::Client (default headers, cookies, TLS).

use std::future::Future;
use std::time::Duration;

use pivot_engine::{Hierarchy, HierarchyError, MetricType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error(transparent)]
    Decode(#[from] HierarchyError),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Anything that can produce the hierarchy for a metric type.
pub trait HierarchySource {
    fn fetch_hierarchy(&self, metric: MetricType) -> impl Future<Output = Result<Hierarchy, FetchError>> + Send;
}

/// `GET {base}/metrics/hierarchy?metric_type=...`
#[derive(Debug, Clone)]
pub struct HttpHierarchySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHierarchySource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpHierarchySource { client, base_url }
    }

    /// Plain client with a request timeout; for callers without auth.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, base_url))
    }

    pub fn hierarchy_url(&self, metric: MetricType) -> String {
        format!("{}/metrics/hierarchy?metric_type={}", self.base_url, metric.query_value())
    }
}

impl HierarchySource for HttpHierarchySource {
    async fn fetch_hierarchy(&self, metric: MetricType) -> Result<Hierarchy, FetchError> {
        let url = self.hierarchy_url(metric);
        log::debug!(target: "FETCH", "GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let hierarchy = Hierarchy::from_json(metric, &body)?;
        log::info!(
            target: "FETCH",
            "loaded metric={} bytes={} groups={}",
            metric,
            body.len(),
            hierarchy.groups.len()
        );
        Ok(hierarchy)
    }
}
