// src/table/materialize.rs

use super::{ColumnSpec, Row, Table, Value};
use std::{collections::HashSet, fmt, str::FromStr};
use thiserror::Error;
use tracing::{debug, warn};

/// How many trailing rows to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLimit {
    #[default]
    All,
    Last(usize),
}

impl FromStr for RowLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(RowLimit::All);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("row limit must be positive or \"all\"".to_string()),
            Ok(n) => Ok(RowLimit::Last(n)),
            Err(_) => Err(format!("invalid row limit {:?}: expected \"all\" or a number", s)),
        }
    }
}

impl fmt::Display for RowLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLimit::All => f.write_str("all"),
            RowLimit::Last(n) => write!(f, "{}", n),
        }
    }
}

/// Why a dataset produced no table. The message is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmptyTable {
    #[error("Данные отсутствуют.")]
    NoRows,
    #[error("Нет уникальных данных по полю \"{label}\".")]
    NoUniqueRows { key: String, label: String },
}

/// Hashable identity of a key value. Text and numbers never compare equal.
#[derive(PartialEq, Eq, Hash)]
enum KeyValue<'a> {
    Text(&'a str),
    Number(u64),
}

impl<'a> KeyValue<'a> {
    fn of(value: &'a Value) -> Option<Self> {
        match value {
            Value::Text(s) if s.is_empty() => None,
            Value::Text(s) => Some(KeyValue::Text(s)),
            // -0.0 and 0.0 are the same key
            Value::Number(n) if *n == 0.0 => Some(KeyValue::Number(0f64.to_bits())),
            Value::Number(n) => Some(KeyValue::Number(n.to_bits())),
        }
    }
}

/// Filter, limit and project `rows` into a [`Table`].
///
/// - `unique_by` keeps the first row for each distinct non-empty value of
///   that key; rows without a value are dropped.
/// - `limit` keeps the trailing rows, preserving their order.
/// - An empty `columns` derives one column per key of the first kept row.
pub fn materialize(
    rows: &[Row],
    columns: &[ColumnSpec],
    unique_by: Option<&str>,
    limit: RowLimit,
) -> Result<Table, EmptyTable> {
    if rows.is_empty() {
        return Err(EmptyTable::NoRows);
    }

    let mut kept: Vec<&Row> = match unique_by {
        Some(key) => {
            let mut seen = HashSet::new();
            let mut unique: Vec<&Row> = Vec::new();
            for row in rows {
                if let Some(k) = row.get(key).and_then(KeyValue::of) {
                    if seen.insert(k) {
                        unique.push(row);
                    }
                }
            }
            if unique.is_empty() {
                let label = columns
                    .iter()
                    .find(|c| c.key == key)
                    .map(|c| c.label.clone())
                    .unwrap_or_else(|| key.to_string());
                warn!(key, label = %label, "every row was dropped while de-duplicating");
                return Err(EmptyTable::NoUniqueRows {
                    key: key.to_string(),
                    label,
                });
            }
            debug!(key, before = rows.len(), after = unique.len(), "de-duplicated rows");
            unique
        }
        None => rows.iter().collect(),
    };

    let columns: Vec<ColumnSpec> = if columns.is_empty() {
        kept[0].keys().map(|k| ColumnSpec::new(k, k)).collect()
    } else {
        columns.to_vec()
    };

    if let RowLimit::Last(n) = limit {
        if kept.len() > n {
            kept.drain(..kept.len() - n);
        }
    }

    let rows = kept
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(&c.key).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(Table { columns, rows })
}

/// Keep only rows whose `key` holds a number greater than zero.
pub fn retain_positive(rows: &[Row], key: &str) -> Vec<Row> {
    rows.iter()
        .filter(|row| {
            row.get(key)
                .and_then(Value::as_number)
                .is_some_and(|n| n > 0.0)
        })
        .cloned()
        .collect()
}
