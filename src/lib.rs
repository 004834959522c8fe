//! Client for the LSN-Online statistics database of Lower Saxony.
//!
//! Extracts municipal tax-revenue tables by replaying the browser workflow of
//! the service: session handshake, form query, delayed result page, and
//! structural parsing of the returned HTML.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use lsn_client::{regions, HierarchyLevel, LsnClient};
//!
//! let client = LsnClient::with_defaults()?;
//! if let Some(result) = client
//!     .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
//!     .await
//! {
//!     println!("{} rows for {}", result.rows.len(), result.region.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::LsnClient;
pub use domain::{regions, short_key, tables, HierarchyLevel, Region, TableQuery, TableResult, TableRow};
pub use infrastructure::{LsnConfig, LsnError, LsnResult};
