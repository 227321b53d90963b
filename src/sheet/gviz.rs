// src/sheet/gviz.rs
//
// Google Visualization query responses look like
// `/*O_o*/\ngoogle.visualization.Query.setResponse({...});`

use super::{RawCell, RawTable, RawValue};
use crate::error::SourceError;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;
use tracing::{debug, trace};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<QueryError>,
    #[serde(default)]
    table: Option<GvizTable>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    detailed_message: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GvizTable {
    cols: Vec<GvizColumn>,
    #[serde(default)]
    rows: Vec<GvizRow>,
}

#[derive(Debug, Deserialize)]
struct GvizColumn {
    #[serde(default)]
    id: String,
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
struct GvizRow {
    #[serde(default)]
    c: Vec<Option<GvizCell>>,
}

#[derive(Debug, Deserialize)]
struct GvizCell {
    /// `None` when the key is missing; `Some(Json::Null)` for an explicit null.
    #[serde(default, deserialize_with = "present")]
    v: Option<Json>,
    #[serde(default)]
    f: Option<String>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Json>, D::Error> {
    Json::deserialize(d).map(Some)
}

/// Cut the JSON object out of the JSONP wrapper.
fn unwrap_envelope(body: &str) -> Result<&str, SourceError> {
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&body[start..=end]),
        _ => Err(SourceError::Malformed(
            "no JSON object in visualization response".into(),
        )),
    }
}

fn raw_value(v: Json) -> RawValue {
    match v {
        Json::Null => RawValue::Null,
        Json::Bool(b) => RawValue::Bool(b),
        Json::Number(n) => n.as_f64().map_or(RawValue::Null, RawValue::Number),
        Json::String(s) => RawValue::Text(s),
        Json::Array(items) => {
            let parts: Option<Vec<f64>> = items.iter().map(Json::as_f64).collect();
            match parts {
                Some(parts) => RawValue::Parts(parts),
                None => {
                    trace!(?items, "non-numeric array cell treated as empty");
                    RawValue::Null
                }
            }
        }
        Json::Object(_) => RawValue::Null,
    }
}

fn raw_cell(cell: Option<GvizCell>) -> RawCell {
    let Some(cell) = cell else {
        return RawCell::absent();
    };
    let raw = match cell.v {
        Some(v) => raw_value(v),
        None => cell
            .f
            .clone()
            .map_or(RawValue::Null, RawValue::Text),
    };
    RawCell {
        raw,
        formatted: cell.f,
    }
}

/// Decode a visualization query response into a [`RawTable`].
pub fn parse_response(body: &str) -> Result<RawTable, SourceError> {
    let envelope: Envelope = serde_json::from_str(unwrap_envelope(body)?)?;

    if envelope.status.as_deref() == Some("error") {
        let detail = envelope
            .errors
            .first()
            .map(|e| {
                let text = e
                    .detailed_message
                    .as_deref()
                    .or(e.message.as_deref())
                    .unwrap_or("");
                format!("{} {}", e.reason, text).trim().to_string()
            })
            .unwrap_or_else(|| "unknown error".into());
        return Err(SourceError::Malformed(format!("query failed: {}", detail)));
    }

    let table = envelope
        .table
        .ok_or_else(|| SourceError::Malformed("response has no table".into()))?;

    let headers: Vec<String> = table
        .cols
        .into_iter()
        .map(|c| if c.label.is_empty() { c.id } else { c.label })
        .collect();

    let rows: Vec<Vec<RawCell>> = table
        .rows
        .into_iter()
        .map(|r| r.c.into_iter().map(raw_cell).collect())
        .collect();

    debug!(columns = headers.len(), rows = rows.len(), "decoded visualization table");
    Ok(RawTable { headers, rows })
}
