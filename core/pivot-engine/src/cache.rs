//! FILENAME: core/pivot-engine/src/cache.rs
//! Row Cache - flattened rows per metric type.
//!
//! Entries are immutable snapshots (`Arc<[TimeSeriesRow]>`). A `put`
//! replaces the whole entry; nothing is ever merged. Concurrent writers for
//! the same metric race and the last `put` wins.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::definition::{MetricType, TimeSeriesRow};

/// Shared, read-only snapshot of a metric's rows.
pub type RowSnapshot = Arc<[TimeSeriesRow]>;

/// Storage for flattened rows, keyed by metric type.
pub trait RowCache {
    fn get(&self, metric: MetricType) -> Option<RowSnapshot>;

    /// Replaces the entry for `metric` wholesale.
    fn put(&self, metric: MetricType, rows: RowSnapshot);

    /// Drops the entry so the next load recomputes it.
    fn invalidate(&self, metric: MetricType);
}

/// In-process cache for the lifetime of a session.
#[derive(Debug, Default)]
pub struct MemoryRowCache {
    entries: RwLock<FxHashMap<MetricType, RowSnapshot>>,
}

impl MemoryRowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RowCache for MemoryRowCache {
    fn get(&self, metric: MetricType) -> Option<RowSnapshot> {
        // Entries are swapped whole, so a poisoned map is still consistent.
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries.get(&metric).cloned()
    }

    fn put(&self, metric: MetricType, rows: RowSnapshot) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        log::debug!(target: "CACHE", "replace metric={} rows={}", metric, rows.len());
        entries.insert(metric, rows);
    }

    fn invalidate(&self, metric: MetricType) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if entries.remove(&metric).is_some() {
            log::debug!(target: "CACHE", "invalidated metric={}", metric);
        }
    }
}

impl<C: RowCache + ?Sized> RowCache for Arc<C> {
    fn get(&self, metric: MetricType) -> Option<RowSnapshot> {
        (**self).get(metric)
    }

    fn put(&self, metric: MetricType, rows: RowSnapshot) {
        (**self).put(metric, rows)
    }

    fn invalidate(&self, metric: MetricType) {
        (**self).invalidate(metric)
    }
}
