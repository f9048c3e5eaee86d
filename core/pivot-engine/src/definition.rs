//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - rows, metric types and the user's filter/sort intent.
//!
//! These structures are designed to be:
//! - Serializable (sent to whichever presentation layer renders them)
//! - Cheap to clone as immutable snapshots
//! - Free of any rendering or I/O concerns

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::period::{yoy_key, PeriodToken};

/// Rendering aid that marks rows belonging to the same top-level entity.
/// Assigned fresh on every flatten; never a durable identifier.
pub type GroupId = u32;

// ============================================================================
// METRIC TYPE
// ============================================================================

/// Which registration breakdown a hierarchy describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// fuel -> makers
    MakerVsFuel,
    /// maker -> vehicle categories
    MakerVsVehicleClass,
}

impl MetricType {
    pub const ALL: [MetricType; 2] = [MetricType::MakerVsFuel, MetricType::MakerVsVehicleClass];

    /// Value of the `metric_type` query parameter.
    pub fn query_value(&self) -> &'static str {
        match self {
            MetricType::MakerVsFuel => "maker_vs_fuel",
            MetricType::MakerVsVehicleClass => "maker_vs_vehicle_class",
        }
    }

    /// Header labels for the two label columns (group, sub-row).
    pub fn label_headers(&self) -> (&'static str, &'static str) {
        match self {
            MetricType::MakerVsFuel => ("Fuel", "Manufacturer"),
            MetricType::MakerVsVehicleClass => ("Maker", "Category"),
        }
    }

    /// Segment used in report file names (`..._MakerVsFuelReport_...`).
    pub fn report_suffix(&self) -> &'static str {
        match self {
            MetricType::MakerVsFuel => "MakerVsFuel",
            MetricType::MakerVsVehicleClass => "MakerVsVehicleClass",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "maker_vs_fuel" => Ok(MetricType::MakerVsFuel),
            "maker_vs_vehicle_class" => Ok(MetricType::MakerVsVehicleClass),
            other => Err(format!("unknown metric type: {}", other)),
        }
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// One flattened pivot row: a child entity under its top-level group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    /// Label of the top-level entity (fuel type or maker).
    pub group_label: String,

    /// See [`GroupId`].
    pub group_id: GroupId,

    /// Label of the child entity (maker or vehicle category).
    pub sub_label: String,

    /// Sparse period values, keyed by raw token. May also carry
    /// upstream-supplied `<token>_YOY` entries.
    pub values: BTreeMap<PeriodToken, f64>,
}

impl TimeSeriesRow {
    pub fn new(group_label: impl Into<String>, group_id: GroupId, sub_label: impl Into<String>) -> Self {
        TimeSeriesRow {
            group_label: group_label.into(),
            group_id,
            sub_label: sub_label.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, token: impl Into<String>, value: f64) -> Self {
        self.values.insert(token.into(), value);
        self
    }

    /// Count for a period, with absent periods reading as zero.
    pub fn period_value(&self, token: &str) -> f64 {
        self.values.get(token).copied().unwrap_or(0.0)
    }

    /// Upstream year-over-year percentage for a full-year token, if supplied.
    pub fn yoy_value(&self, token: &str) -> Option<f64> {
        self.values.get(&yoy_key(token)).copied()
    }
}

// ============================================================================
// FILTER / SORT STATE
// ============================================================================

/// Column a user can sort by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    GroupLabel,
    SubLabel,
    /// A period column, or a derived `<token>_YOY` key.
    Period(PeriodToken),
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("empty sort column".to_string()),
            "group" | "groupLabel" | "group_label" => Ok(SortColumn::GroupLabel),
            "sub" | "subLabel" | "sub_label" => Ok(SortColumn::SubLabel),
            token => Ok(SortColumn::Period(token.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Transient search and sort state for one metric view.
///
/// `sort_column: None` keeps hierarchy order, which is also the default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSortState {
    pub search_text: String,
    pub sort_column: Option<SortColumn>,
    pub sort_direction: SortDirection,
}

impl FilterSortState {
    pub fn with_search(search_text: impl Into<String>) -> Self {
        FilterSortState {
            search_text: search_text.into(),
            ..Default::default()
        }
    }

    /// Header-click semantics: a new column sorts ascending, the same column
    /// again flips the direction.
    pub fn select_sort_column(&mut self, column: SortColumn) {
        if self.sort_column.as_ref() == Some(&column) {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_column = Some(column);
            self.sort_direction = SortDirection::Ascending;
        }
    }
}
