use crate::config::DatasetConfig;
use crate::dashboard::TableView;
use crate::table::{Table, Value};
use anyhow::{bail, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use tracing::{info, warn};

const MAX_SHEET_NAME: usize = 31;

/// Excel sheet names: at most 31 chars, none of `[]:*?/\`, no leading or
/// trailing apostrophe, unique ignoring case.
fn sheet_name(wanted: &str, taken: &mut HashSet<String>) -> String {
    let cleaned: String = wanted
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    let base: String = if cleaned.is_empty() {
        format!("Sheet{}", taken.len() + 1)
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut name = base.clone();
    let mut n = 2;
    while taken.contains(&name.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        name = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    taken.insert(name.to_lowercase());
    name
}

fn fill_sheet(sheet: &mut Worksheet, table: &Table, header: &Format) -> Result<()> {
    for (col, label) in table.labels().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, label, header)?;
        let widest = table
            .rows
            .iter()
            .map(|r| r[col as usize].to_string().chars().count())
            .chain(std::iter::once(label.chars().count()))
            .max()
            .unwrap_or(8);
        sheet.set_column_width(col, (widest.clamp(8, 60) + 2) as f64)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            match value {
                Value::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                Value::Text(s) if s.is_empty() => {}
                Value::Text(s) => {
                    sheet.write_string(r, c, s.as_str())?;
                }
            }
        }
    }
    Ok(())
}

/// One worksheet per dataset that has a table, in dataset order.
pub fn build_workbook(views: &[(&DatasetConfig, TableView)]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let mut taken = HashSet::new();

    for (dataset, view) in views {
        let Some(table) = view.table() else {
            warn!(dataset = %dataset.name, "no data to export, skipping worksheet");
            continue;
        };
        let name = sheet_name(&dataset.export_name, &mut taken);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        fill_sheet(sheet, table, &header)?;
        info!(dataset = %dataset.name, sheet = %name, rows = table.len(), "added worksheet");
    }

    if taken.is_empty() {
        bail!("no dataset has data to export");
    }
    Ok(workbook)
}

/// The workbook as XLSX bytes.
pub fn to_xlsx(views: &[(&DatasetConfig, TableView)]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(views)?;
    Ok(workbook.save_to_buffer()?)
}
