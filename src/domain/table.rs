use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::constants::tables;
use crate::domain::region::{HierarchyLevel, Region};

/// One year's observation of the tax-revenue report for a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, rename = "LSNTableRow")]
pub struct TableRow {
    #[serde(rename = "jahr")]
    pub year: i32,
    #[serde(rename = "einwohner")]
    pub population: f64,
    #[serde(rename = "steuereinnahmenGesamt")]
    pub total_tax_revenue: f64,
    #[serde(rename = "grundsteuerA")]
    pub property_tax_a: f64,
    #[serde(rename = "grundsteuerB")]
    pub property_tax_b: f64,
    /// Gewerbesteuer, net of the levy
    #[serde(rename = "gewerbesteuer")]
    pub trade_tax_net: f64,
    #[serde(rename = "einkommensteueranteil")]
    pub income_tax_share: f64,
    /// Not reported in early years
    #[serde(rename = "umsatzsteueranteil")]
    pub vat_share: Option<f64>,
}

/// Snapshot produced by a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, rename = "LSNTableResult")]
pub struct TableResult {
    pub table_id: String,
    pub region: Region,
    /// Rows in document order (years ascending on the source page)
    #[serde(rename = "data")]
    pub rows: Vec<TableRow>,
    pub timestamp: DateTime<Utc>,
}

impl TableResult {
    /// `true` when the page was fetched but no row could be extracted
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.iter().map(|row| row.year)
    }

    pub fn row_for_year(&self, year: i32) -> Option<&TableRow> {
        self.rows.iter().find(|row| row.year == year)
    }
}

/// Parameters of one table query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub table_id: String,
    pub region_id: String,
    pub level: HierarchyLevel,
}

impl TableQuery {
    pub fn new(table_id: impl Into<String>, region_id: impl Into<String>, level: HierarchyLevel) -> Self {
        Self {
            table_id: table_id.into(),
            region_id: region_id.into(),
            level,
        }
    }

    /// Tax-revenue time series for a region
    pub fn steuereinnahmen(region_id: impl Into<String>, level: HierarchyLevel) -> Self {
        Self::new(tables::STEUEREINNAHMEN_ZEITREIHE, region_id, level)
    }
}
