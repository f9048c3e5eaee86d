//! FILENAME: core/pivot-engine/src/lib.rs
//! Registration statistics pivot engine.
//!
//! Turns a fetched maker/fuel or maker/vehicle-class hierarchy into a
//! paged, filterable pivot over period columns. Pure computation: no I/O,
//! no async, no rendering toolkit.
//!
//! Layers:
//! - `period`: Period token parsing and canonical ordering
//! - `definition`: Rows, metric types and filter/sort intent (what the pivot IS)
//! - `hierarchy`: Payload parsing and flattening into rows
//! - `columns`: Union-of-periods column assembly and cell rendering
//! - `cache`: Per-metric row snapshots (what we computed)
//! - `view`: Filter, sort, paging and the render model (WHAT we display)
//! - `engine`: Orchestration (HOW we calculate)

pub mod period;
pub mod definition;
pub mod hierarchy;
pub mod columns;
pub mod cache;
pub mod view;
pub mod engine;

pub use period::*;
pub use definition::*;
pub use hierarchy::{flatten, Hierarchy, HierarchyError, HierarchyGroup, HierarchyLeaf, HierarchyShape};
pub use columns::*;
pub use cache::*;
pub use view::*;
pub use engine::{calculate_view, PivotEngine, PivotRequest, DEFAULT_PER_PAGE};
