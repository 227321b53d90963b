// src/sheet/delimited.rs

use super::{RawCell, RawTable, RawValue};
use crate::error::SourceError;
use csv::ReaderBuilder;
use tracing::debug;

/// 1) Trim whitespace; the reader has already undone CSV quoting.
fn clean_str(raw: &str) -> &str {
    raw.trim()
}

/// 2) Infer a number only when the text survives the round trip, so
///    `"007"` or `"5,5"` stay text.
fn infer_value(field: &str) -> RawValue {
    let cleaned = clean_str(field);
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() && n.to_string() == cleaned => RawValue::Number(n),
        _ => RawValue::Text(cleaned.to_string()),
    }
}

/// Decode delimited text whose first record is the header row.
pub fn parse_delimited(body: &str, delimiter: u8) -> Result<RawTable, SourceError> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| clean_str(h).to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| RawCell::new(infer_value(field)))
                .collect(),
        );
    }

    debug!(columns = headers.len(), rows = rows.len(), "decoded delimited table");
    Ok(RawTable { headers, rows })
}
