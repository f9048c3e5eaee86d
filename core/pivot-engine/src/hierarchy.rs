//! FILENAME: core/pivot-engine/src/hierarchy.rs
//! Hierarchy payloads and flattening into pivot rows.
//!
//! The endpoint returns one of two nested shapes depending on the metric:
//! - `maker_vs_fuel`: `[{ "fuel": .., "makers": [{ "name": .., "periodValues": {..} }] }]`
//! - `maker_vs_vehicle_class`: `[{ "maker": .., "categories": [{ "name": .., "periodValues": {..} }] }]`
//!
//! Both normalize to a `Hierarchy` of labelled groups, which `flatten`
//! turns into one `TimeSeriesRow` per child.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::definition::{GroupId, MetricType, TimeSeriesRow};
use crate::period::PeriodToken;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("malformed {metric} hierarchy: {source}")]
    Json {
        metric: MetricType,
        #[source]
        source: serde_json::Error,
    },
}

/// Nesting shape of a hierarchy payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyShape {
    /// fuel -> makers
    FuelMakers,
    /// maker -> categories
    MakerCategories,
}

impl From<MetricType> for HierarchyShape {
    fn from(metric: MetricType) -> Self {
        match metric {
            MetricType::MakerVsFuel => HierarchyShape::FuelMakers,
            MetricType::MakerVsVehicleClass => HierarchyShape::MakerCategories,
        }
    }
}

// ============================================================================
// NORMALIZED HIERARCHY
// ============================================================================

/// A child entity with its raw period values.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyLeaf {
    pub label: String,
    pub period_values: BTreeMap<PeriodToken, f64>,
}

/// A top-level entity and its children, in payload order.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyGroup {
    pub label: String,
    pub children: Vec<HierarchyLeaf>,
}

/// A parsed hierarchy for one metric type.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub metric: MetricType,
    pub groups: Vec<HierarchyGroup>,
}

impl Hierarchy {
    pub fn new(metric: MetricType, groups: Vec<HierarchyGroup>) -> Self {
        Hierarchy { metric, groups }
    }

    pub fn shape(&self) -> HierarchyShape {
        self.metric.into()
    }

    /// Parses an endpoint response body using the shape the metric implies.
    pub fn from_json(metric: MetricType, body: &str) -> Result<Self, HierarchyError> {
        let wrap = |source| HierarchyError::Json { metric, source };

        let groups = match HierarchyShape::from(metric) {
            HierarchyShape::FuelMakers => serde_json::from_str::<Vec<FuelEntry>>(body)
                .map_err(wrap)?
                .into_iter()
                .map(|entry| HierarchyGroup {
                    label: entry.fuel,
                    children: entry.makers.into_iter().map(HierarchyLeaf::from).collect(),
                })
                .collect(),
            HierarchyShape::MakerCategories => serde_json::from_str::<Vec<MakerEntry>>(body)
                .map_err(wrap)?
                .into_iter()
                .map(|entry| HierarchyGroup {
                    label: entry.maker,
                    children: entry.categories.into_iter().map(HierarchyLeaf::from).collect(),
                })
                .collect(),
        };

        Ok(Hierarchy { metric, groups })
    }

    pub fn leaf_count(&self) -> usize {
        self.groups.iter().map(|g| g.children.len()).sum()
    }
}

// ============================================================================
// WIRE SHAPES
// ============================================================================

#[derive(Deserialize)]
struct FuelEntry {
    fuel: String,
    #[serde(default)]
    makers: Vec<ChildEntry>,
}

#[derive(Deserialize)]
struct MakerEntry {
    maker: String,
    #[serde(default)]
    categories: Vec<ChildEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildEntry {
    name: String,
    #[serde(default, deserialize_with = "skip_null_values")]
    period_values: BTreeMap<PeriodToken, f64>,
}

impl From<ChildEntry> for HierarchyLeaf {
    fn from(entry: ChildEntry) -> Self {
        HierarchyLeaf {
            label: entry.name,
            period_values: entry.period_values,
        }
    }
}

/// Upstream sends `null` for periods (and YoY values) it cannot compute.
fn skip_null_values<'de, D>(deserializer: D) -> Result<BTreeMap<PeriodToken, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<PeriodToken, Option<f64>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(token, value)| value.map(|v| (token, v)))
        .collect())
}

// ============================================================================
// FLATTENING
// ============================================================================

/// Flattens a hierarchy into rows, depth-first and top-level-stable.
///
/// `group_id` starts at 1 and is bumped once per top-level entity, including
/// entities without children. Values are copied verbatim; absent periods are
/// defaulted at render time, not here.
pub fn flatten(hierarchy: &Hierarchy) -> Vec<TimeSeriesRow> {
    let mut rows = Vec::with_capacity(hierarchy.leaf_count());
    let mut group_id: GroupId = 0;

    for group in &hierarchy.groups {
        group_id += 1;
        for child in &group.children {
            rows.push(TimeSeriesRow {
                group_label: group.label.clone(),
                group_id,
                sub_label: child.label.clone(),
                values: child.period_values.clone(),
            });
        }
    }

    log::debug!(
        target: "PIVOT",
        "flattened {} hierarchy: groups={} rows={}",
        hierarchy.metric,
        hierarchy.groups.len(),
        rows.len()
    );

    rows
}
