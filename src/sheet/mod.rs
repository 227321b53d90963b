// src/sheet/mod.rs

pub mod delimited;
pub mod gviz;

/// The value of a cell as the spreadsheet sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Numeric sequence such as `[2025, 5, 15, 0, 0, 0]`.
    Parts(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub raw: RawValue,
    /// Upstream formatted text, e.g. `"15.06.2025"` for a date cell.
    pub formatted: Option<String>,
}

impl RawCell {
    pub fn absent() -> Self {
        Self {
            raw: RawValue::Null,
            formatted: None,
        }
    }

    pub fn new(raw: RawValue) -> Self {
        Self {
            raw,
            formatted: None,
        }
    }

    pub fn with_formatted(raw: RawValue, formatted: impl Into<String>) -> Self {
        Self {
            raw,
            formatted: Some(formatted.into()),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.raw == RawValue::Null && self.formatted.is_none()
    }
}

/// A fetched sheet before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    /// Column names: the label, or the column id when the label is blank.
    pub headers: Vec<String>,
    /// One entry per record; may be shorter than `headers`.
    pub rows: Vec<Vec<RawCell>>,
}

/// Payload flavour requested from the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Json,
    Csv,
}

impl PayloadFormat {
    /// Value of the `tqx` query parameter.
    pub fn tqx(&self) -> &'static str {
        match self {
            PayloadFormat::Json => "out:json",
            PayloadFormat::Csv => "out:csv",
        }
    }

    pub fn parse(&self, body: &str) -> Result<RawTable, crate::error::SourceError> {
        match self {
            PayloadFormat::Json => gviz::parse_response(body),
            PayloadFormat::Csv => delimited::parse_delimited(body, b','),
        }
    }
}
