//! FILENAME: app/src/lib.rs
// PURPOSE: Dashboard backend library: configuration, logging, hierarchy
//          fetching and the per-user pivot session.
// CONTEXT: All pivot computation lives in `pivot-engine`; workbook writing in
//          `report-export`. This crate owns the async edge and the state machine.

pub mod config;
pub mod fetch;
pub mod logging;
pub mod session;
pub mod table;

pub use config::{ConfigError, DashboardConfig};
pub use fetch::{FetchError, HierarchySource, HttpHierarchySource};
pub use logging::{format_line, init_logging, next_seq};
pub use session::{LoadState, ReportSession, SessionError};
pub use table::format_table;
