//! Export of extraction results as JSON (full result) or CSV (rows only)

use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::domain::table::TableResult;

/// CSV header; same names and order as the JSON row fields
pub const CSV_COLUMNS: [&str; 8] = [
    "jahr",
    "einwohner",
    "steuereinnahmenGesamt",
    "grundsteuerA",
    "grundsteuerB",
    "gewerbesteuer",
    "einkommensteueranteil",
    "umsatzsteueranteil",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

/// Pretty-printed JSON with the service's German field names
pub fn to_json_string(result: &TableResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize table result")
}

/// One line per year; a missing VAT share is an empty field.
pub fn to_csv_string(result: &TableResult) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_COLUMNS)
        .context("Failed to write CSV header")?;
    for row in &result.rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to serialize row {}", row.year))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn render(result: &TableResult, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json_string(result),
        ExportFormat::Csv => to_csv_string(result),
    }
}

/// Write `result` to `path` in `format`, creating parent directories as needed.
pub async fn write(result: &TableResult, path: &Path, format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let content = render(result, format)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        "💾 Saved {} rows to {} ({})",
        result.rows.len(),
        path.display(),
        format
    );
    Ok(())
}

pub async fn write_json(result: &TableResult, path: &Path) -> Result<()> {
    write(result, path, ExportFormat::Json).await
}

pub async fn write_csv(result: &TableResult, path: &Path) -> Result<()> {
    write(result, path, ExportFormat::Csv).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::region::Region;
    use crate::domain::table::TableRow;
    use chrono::Utc;

    fn sample() -> TableResult {
        TableResult {
            table_id: "Z9200001".to_string(),
            region: Region::new("254026000", "254026", "Nordstemmen"),
            rows: vec![TableRow {
                year: 2022,
                population: 10_789.0,
                total_tax_revenue: 11_981_453.0,
                property_tax_a: 95_233.0,
                property_tax_b: 1_598_745.0,
                trade_tax_net: 4_123_456.0,
                income_tax_share: 5_456_789.0,
                vat_share: None,
            }],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn json_uses_service_field_names() {
        let json = to_json_string(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tableId"], "Z9200001");
        assert_eq!(value["region"]["schluessel"], "254026");
        assert_eq!(value["data"][0]["jahr"], 2022);
        assert_eq!(value["data"][0]["steuereinnahmenGesamt"], 11_981_453.0);
        assert!(value["data"][0]["umsatzsteueranteil"].is_null());
    }

    #[test]
    fn csv_has_one_line_per_year() {
        let csv = to_csv_string(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert_eq!(lines[1], "2022,10789.0,11981453.0,95233.0,1598745.0,4123456.0,5456789.0,");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn csv_header_matches_json_row_fields() {
        let json = serde_json::to_value(&sample().rows[0]).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

        let mut expected = CSV_COLUMNS.to_vec();
        expected.sort_unstable();
        let mut keys = keys;
        keys.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn empty_result_still_has_csv_header() {
        let mut result = sample();
        result.rows.clear();
        assert_eq!(to_csv_string(&result).unwrap().trim_end(), CSV_COLUMNS.join(","));
    }

    #[tokio::test]
    async fn write_csv_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nordstemmen.csv");

        write_csv(&sample(), &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("jahr,einwohner,"));
        assert_eq!(written.lines().count(), 2);
    }

    #[tokio::test]
    async fn write_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("nordstemmen.json");

        write_json(&sample(), &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let back: TableResult = serde_json::from_str(&written).unwrap();
        assert_eq!(back.rows.len(), 1);
        assert_eq!(back.region.name, "Nordstemmen");
    }
}
