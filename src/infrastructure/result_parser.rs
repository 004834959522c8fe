//! Result page parser for the Steuereinnahmen report family
//!
//! The result page is hand-maintained HTML without a schema. Its only contract
//! is structural:
//!
//! ```html
//! <TD class=left COLSPAN=8>254026 Nordstemmen</TD>
//! ...
//! <TR class=line1><TD class=left>&nbsp;2019</TD><TD>12.345</TD>...seven cells...</TR>
//! ```
//!
//! Rows are matched one `<tr>` at a time. A row that does not fit the layout is
//! skipped; the rest of the page is still extracted.

#![allow(clippy::uninlined_format_args)]

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::error::{NumberFormatError, ParsingError, ParsingResult};
use super::number_format::{parse_amount, parse_nullable_amount};
use crate::domain::constants::{query::SHORT_KEY_LEN, UNKNOWN_REGION_NAME};
use crate::domain::region::Region;
use crate::domain::table::{TableResult, TableRow};

/// Numeric cells following the year cell
const NUMERIC_CELLS: usize = 7;

const ROW_SELECTOR: &str = "tr";
const CELL_SELECTOR: &str = "td";
const HEADER_SELECTOR: &str = "td.left[colspan]";

const ROW_CLASS_PATTERN: &str = r"^line\d+$";
const YEAR_PATTERN: &str = r"^\d{4}$";
const AMOUNT_PATTERN: &str = r"^[0-9.,\-]+$";
const HEADER_PATTERN: &str = r"^(\d+)\s+(.+)$";
/// Year cell directly followed by an integer cell; only used to detect rows
/// the full pattern could not read.
const FALLBACK_PATTERN: &str =
    r#"(?i)<td\s+class="?left"?\s*>(?:&nbsp;|\s)+(\d{4})\s*</td>\s*<td>(\d+)</td>"#;

/// Narrow seam between the query pipeline and page layout knowledge
pub trait ResultParser: Send + Sync {
    /// Extract region and rows. Never fails: an unreadable page yields a
    /// result without rows.
    fn parse(&self, html: &str, table_id: &str, region_id: &str) -> TableResult;
}

#[derive(Debug, Error)]
enum RowRejection {
    #[error("no year cell")]
    NoYearCell,
    #[error("expected 7 numeric cells, found {0}")]
    MissingCells(usize),
    #[error("cell {index} is not numeric: '{text}'")]
    NotNumeric { index: usize, text: String },
    #[error("cell {index} contains nested markup")]
    NestedMarkup { index: usize },
    #[error(transparent)]
    InvalidAmount(#[from] NumberFormatError),
}

/// Diagnostics of a single parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Data rows that did not fit the layout
    pub skipped: usize,
    /// Years found by the fallback scan; only filled when no row was readable
    pub partial_years: Vec<String>,
}

/// Parser for the tax-revenue result page
pub struct ResultPageParser {
    row_selector: Selector,
    cell_selector: Selector,
    header_selector: Selector,
    row_class: Regex,
    year: Regex,
    amount: Regex,
    header: Regex,
    fallback: Regex,
}

impl ResultPageParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            row_selector: Self::compile_selector(ROW_SELECTOR)?,
            cell_selector: Self::compile_selector(CELL_SELECTOR)?,
            header_selector: Self::compile_selector(HEADER_SELECTOR)?,
            row_class: Self::compile_pattern(ROW_CLASS_PATTERN)?,
            year: Self::compile_pattern(YEAR_PATTERN)?,
            amount: Self::compile_pattern(AMOUNT_PATTERN)?,
            header: Self::compile_pattern(HEADER_PATTERN)?,
            fallback: Self::compile_pattern(FALLBACK_PATTERN)?,
        })
    }

    fn compile_selector(selector: &str) -> ParsingResult<Selector> {
        Selector::parse(selector).map_err(|e| ParsingError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }

    fn compile_pattern(pattern: &str) -> ParsingResult<Regex> {
        Regex::new(pattern).map_err(|e| ParsingError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }

    /// Region from the labeled header cell, or the placeholder.
    fn extract_region(&self, document: &Html, region_id: &str) -> Region {
        let labeled = document.select(&self.header_selector).find_map(|cell| {
            let text = cell.text().next()?.trim();
            let caps = self.header.captures(text)?;
            Some((caps[1].to_string(), caps[2].trim().to_string()))
        });

        match labeled {
            Some((short_key, name)) => Region::new(region_id, short_key, name),
            None => {
                debug!("No region header found, using placeholder for {}", region_id);
                Region::new(
                    region_id,
                    region_id.chars().take(SHORT_KEY_LEN).collect::<String>(),
                    UNKNOWN_REGION_NAME,
                )
            }
        }
    }

    fn is_data_row(&self, row: &ElementRef<'_>) -> bool {
        row.value()
            .attr("class")
            .is_some_and(|class| self.row_class.is_match(class.trim()))
    }

    fn extract_row(&self, row: ElementRef<'_>) -> Result<TableRow, RowRejection> {
        let cells: Vec<ElementRef<'_>> = row.select(&self.cell_selector).collect();

        let (year_index, year) = cells
            .iter()
            .enumerate()
            .find_map(|(index, cell)| {
                let is_left = cell.value().attr("class").is_some_and(|c| c.eq_ignore_ascii_case("left"));
                let text = cell_text(cell);
                (is_left && self.year.is_match(&text)).then_some((index, text))
            })
            .ok_or(RowRejection::NoYearCell)?;
        let year: i32 = year.parse().map_err(|_| RowRejection::NoYearCell)?;

        let value_cells: Vec<&ElementRef<'_>> =
            cells.iter().skip(year_index + 1).take(NUMERIC_CELLS).collect();
        if value_cells.len() < NUMERIC_CELLS {
            return Err(RowRejection::MissingCells(value_cells.len()));
        }
        // Footnote marks (<sup>) or links would otherwise merge into the number
        if let Some(index) = value_cells
            .iter()
            .position(|cell| cell.children().any(|child| child.value().is_element()))
        {
            return Err(RowRejection::NestedMarkup { index });
        }
        let values: Vec<String> = value_cells.into_iter().map(cell_text).collect();
        if let Some((index, text)) = values
            .iter()
            .enumerate()
            .find(|(_, text)| !self.amount.is_match(text))
        {
            return Err(RowRejection::NotNumeric {
                index,
                text: text.clone(),
            });
        }

        Ok(TableRow {
            year,
            population: parse_amount(&values[0])?,
            total_tax_revenue: parse_amount(&values[1])?,
            property_tax_a: parse_amount(&values[2])?,
            property_tax_b: parse_amount(&values[3])?,
            trade_tax_net: parse_amount(&values[4])?,
            income_tax_share: parse_amount(&values[5])?,
            vat_share: parse_nullable_amount(&values[6])?,
        })
    }

    /// Report rows that exist but could not be read in full
    fn report_partial_rows(&self, html: &str, region_id: &str) -> Vec<String> {
        let partial: Vec<String> = self
            .fallback
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect();

        if partial.is_empty() {
            warn!("No data rows found in result page for region {}", region_id);
            return partial;
        }
        for year in &partial {
            warn!("Partial data match for year: {}", year);
        }
        warn!(
            "⚠️ {} row(s) detected for region {} but none could be parsed; the page layout may have changed",
            partial.len(),
            region_id
        );
        partial
    }

    /// Same as [`ResultParser::parse`], also returning what was skipped.
    pub fn parse_with_report(
        &self,
        html: &str,
        table_id: &str,
        region_id: &str,
    ) -> (TableResult, ParseReport) {
        let document = Html::parse_document(html);
        let region = self.extract_region(&document, region_id);

        let mut rows = Vec::new();
        let mut report = ParseReport::default();
        for row in document.select(&self.row_selector).filter(|row| self.is_data_row(row)) {
            match self.extract_row(row) {
                Ok(parsed) => rows.push(parsed),
                Err(reason) => {
                    report.skipped += 1;
                    debug!("Skipping malformed row: {}", reason);
                }
            }
        }

        if rows.is_empty() {
            report.partial_years = self.report_partial_rows(html, region_id);
        } else {
            info!(
                "Parsed {} row(s) for {} ({}), {} skipped",
                rows.len(),
                region.name,
                table_id,
                report.skipped
            );
        }

        let result = TableResult {
            table_id: table_id.to_string(),
            region,
            rows,
            timestamp: Utc::now(),
        };
        (result, report)
    }
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    // trim() also removes the &nbsp; padding (U+00A0)
    cell.text().collect::<String>().trim().to_string()
}

impl ResultParser for ResultPageParser {
    fn parse(&self, html: &str, table_id: &str, region_id: &str) -> TableResult {
        self.parse_with_report(html, table_id, region_id).0
    }
}
