//! Domain module - LSN-Online entities and reference data
//!
//! Regions, hierarchy levels, table rows and results, plus the catalog of
//! known region and table identifiers.

pub mod constants;
pub mod region;
pub mod table;

pub use constants::{regions, tables};
pub use region::{short_key, HierarchyLevel, Region};
pub use table::{TableQuery, TableResult, TableRow};
