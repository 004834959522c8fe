//! German number format (`1.234,56`) parsing
//!
//! `.` groups thousands, `,` separates decimals. A lone `-` is the service's
//! "nothing to report" marker.

use super::error::NumberFormatError;

fn is_not_applicable(text: &str) -> bool {
    text.is_empty() || text == "-"
}

/// Parse an amount; `-` and empty text count as zero.
pub fn parse_amount(text: &str) -> Result<f64, NumberFormatError> {
    let text = text.trim();
    if is_not_applicable(text) {
        return Ok(0.0);
    }

    let invalid = || NumberFormatError {
        input: text.to_string(),
    };

    // f64::from_str also accepts "inf" and "NaN"
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
    {
        return Err(invalid());
    }

    let normalized = text.replace('.', "").replacen(',', ".", 1);
    normalized.parse::<f64>().map_err(|_| invalid())
}

/// Parse an amount that may be unreported; `-` and empty text yield `None`.
pub fn parse_nullable_amount(text: &str) -> Result<Option<f64>, NumberFormatError> {
    let text = text.trim();
    if is_not_applicable(text) {
        return Ok(None);
    }
    parse_amount(text).map(Some)
}
