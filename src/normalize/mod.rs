// src/normalize/mod.rs

use crate::sheet::{RawCell, RawTable, RawValue};
use crate::table::{Row, Value};
use tracing::warn;

pub mod date_parser;

pub const YES: &str = "Да";
pub const NO: &str = "Нет";

/// Turn one fetched cell into its display value.
///
/// Never fails: a cell that cannot be decoded becomes the empty string and a
/// warning naming `label` is logged.
pub fn normalize_cell(cell: &RawCell, label: &str) -> Value {
    if cell.is_absent() {
        return Value::empty();
    }

    if let Some(formatted) = cell.formatted.as_deref() {
        if date_parser::has_day_month_year_prefix(formatted) {
            return Value::Text(formatted.to_string());
        }
    }

    match &cell.raw {
        RawValue::Parts(parts) if parts.len() >= 3 => {
            match date_parser::datetime_from_parts(parts) {
                Some(dt) => Value::Text(date_parser::format_display(&dt)),
                None => {
                    warn!(column = label, ?parts, "date parts out of range, cell left empty");
                    Value::empty()
                }
            }
        }
        RawValue::Text(s) if s.starts_with("Date(") => match date_parser::parse_date_call(s) {
            Some(dt) => Value::Text(date_parser::format_display(&dt)),
            None => {
                warn!(column = label, value = %s, "malformed Date() value, cell left empty");
                Value::empty()
            }
        },
        RawValue::Bool(true) => Value::from(YES),
        RawValue::Bool(false) => Value::from(NO),
        RawValue::Number(n) => Value::Number(*n),
        RawValue::Text(s) => Value::Text(s.clone()),
        RawValue::Parts(_) | RawValue::Null => Value::empty(),
    }
}

/// Normalize every record of `table` into a [`Row`] keyed by header.
pub fn normalize_table(table: &RawTable) -> Vec<Row> {
    let absent = RawCell::absent();
    table
        .rows
        .iter()
        .map(|cells| {
            table
                .headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = cells.get(i).unwrap_or(&absent);
                    (header.clone(), normalize_cell(cell, header))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(raw: RawValue) -> RawCell {
        RawCell::new(raw)
    }

    #[test]
    fn absent_and_null_are_empty() {
        assert_eq!(normalize_cell(&RawCell::absent(), "x"), Value::empty());
        assert_eq!(normalize_cell(&cell(RawValue::Null), "x"), Value::empty());
    }

    #[test]
    fn formatted_date_is_trusted() {
        let c = RawCell::with_formatted(RawValue::Text("Date(2025,5,15)".into()), "15.06.2025");
        assert_eq!(normalize_cell(&c, "Дата"), Value::from("15.06.2025"));

        // a formatted value that is not a date does not short-circuit
        let c = RawCell::with_formatted(RawValue::Number(1200.0), "1 200");
        assert_eq!(normalize_cell(&c, "Кол-во"), Value::from(1200.0));
    }

    #[test]
    fn date_parts_render_in_local_convention() {
        let c = cell(RawValue::Parts(vec![2025.0, 5.0, 15.0, 0.0, 0.0, 0.0]));
        assert_eq!(normalize_cell(&c, "Дата"), Value::from("15.06.2025"));

        let c = cell(RawValue::Parts(vec![2025.0, 5.0, 15.0, 9.0, 41.0, 3.0]));
        assert_eq!(normalize_cell(&c, "Дата"), Value::from("15.06.2025 09:41:03"));
    }

    #[test]
    fn short_parts_are_empty() {
        let c = cell(RawValue::Parts(vec![2025.0, 5.0]));
        assert_eq!(normalize_cell(&c, "Дата"), Value::empty());
    }

    #[test]
    fn date_call_strings() {
        let c = cell(RawValue::Text("Date(2024,11,31,23,59,59)".into()));
        assert_eq!(normalize_cell(&c, "Дата"), Value::from("31.12.2024 23:59:59"));
    }

    #[test]
    fn malformed_date_calls_are_empty() {
        for bad in ["Date(", "Date(2025)", "Date(x,y,z)", "Date(2025,1,1))", "Date(1,2,3) tail"] {
            let c = cell(RawValue::Text(bad.into()));
            assert_eq!(normalize_cell(&c, "Дата"), Value::empty(), "{bad}");
        }
    }

    #[test]
    fn booleans_are_localized() {
        assert_eq!(normalize_cell(&cell(RawValue::Bool(true)), "Оплачено"), Value::from("Да"));
        assert_eq!(normalize_cell(&cell(RawValue::Bool(false)), "Оплачено"), Value::from("Нет"));
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(normalize_cell(&cell(RawValue::Number(5.0)), "n"), Value::from(5));
        assert_eq!(normalize_cell(&cell(RawValue::Text("Песок".into())), "s"), Value::from("Песок"));
    }

    #[test]
    fn table_rows_follow_headers() {
        let table = RawTable {
            headers: vec!["Материал".into(), "Остаток".into()],
            rows: vec![
                vec![cell(RawValue::Text("A".into())), cell(RawValue::Number(5.0))],
                vec![cell(RawValue::Text("B".into()))],
            ],
        };
        let rows = normalize_table(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Остаток"), Some(&Value::from(5)));
        assert_eq!(rows[1].get("Остаток"), Some(&Value::empty()));
        assert_eq!(rows[1].keys().collect::<Vec<_>>(), vec!["Материал", "Остаток"]);
    }

    #[test]
    fn duplicate_headers_keep_last_value() {
        let table = RawTable {
            headers: vec!["a".into(), "a".into()],
            rows: vec![vec![cell(RawValue::Text("1".into())), cell(RawValue::Text("2".into()))]],
        };
        let rows = normalize_table(&table);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].get("a"), Some(&Value::from("2")));
    }
}
