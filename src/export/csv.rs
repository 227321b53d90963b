use crate::config::DatasetConfig;
use crate::dashboard::TableView;
use crate::table::Table;
use anyhow::{anyhow, Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

const BOM: &str = "\u{feff}";

/// Delimited text for `table`: label header, one record per row, BOM first.
///
/// Only fields containing the delimiter, a quote or a line break are quoted.
pub fn to_csv(table: &Table, delimiter: u8) -> Result<String> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(BOM.as_bytes().to_vec());

    wtr.write_record(table.labels())?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("flushing CSV buffer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Write `<export_name>.csv` into `dir` for every dataset that has a table.
/// Returns the written paths.
pub fn write_csv_files(
    dir: &Path,
    views: &[(&DatasetConfig, TableView)],
    delimiter: u8,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    for (dataset, view) in views {
        let Some(table) = view.table() else {
            warn!(dataset = %dataset.name, "no data to export, skipping CSV");
            continue;
        };
        let path = dir.join(format!("{}.csv", dataset.export_name));
        let content = to_csv(table, delimiter)?;
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), rows = table.len(), "wrote CSV");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::table::{ColumnSpec, Value};
    use tempfile::tempdir;

    fn sample() -> Table {
        Table {
            columns: vec![
                ColumnSpec::new("m", "Материал"),
                ColumnSpec::new("c", "Комментарий"),
                ColumnSpec::new("q", "Кол-во"),
            ],
            rows: vec![
                vec![Value::from("Цемент"), Value::from("мешки; 50 кг"), Value::from(12)],
                vec![Value::from("Краска \"белая\""), Value::from("строка\nдве"), Value::from(0.5)],
            ],
        }
    }

    #[test]
    fn semicolon_output_with_bom() {
        let csv = to_csv(&sample(), b';').unwrap();
        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(
            &csv[BOM.len()..],
            "Материал;Комментарий;Кол-во\n\
             Цемент;\"мешки; 50 кг\";12\n\
             \"Краска \"\"белая\"\"\";\"строка\nдве\";0.5\n"
        );
    }

    #[test]
    fn comma_delimiter_quotes_commas_only() {
        let mut table = sample();
        table.rows = vec![vec![Value::from("a,b"), Value::from("c;d"), Value::empty()]];
        let csv = to_csv(&table, b',').unwrap();
        assert_eq!(&csv[BOM.len()..], "Материал,Комментарий,Кол-во\n\"a,b\",c;d,\n");
    }

    #[test]
    fn writes_one_file_per_table() -> Result<()> {
        let dir = tempdir()?;
        let config = Config::default();
        let views = vec![
            (&config.datasets[0], TableView::Table(sample())),
            (&config.datasets[1], TableView::Error("нет".into())),
        ];
        let written = write_csv_files(dir.path(), &views, b';')?;
        assert_eq!(written, vec![dir.path().join("Материалы.csv")]);
        let text = fs::read_to_string(&written[0])?;
        assert!(text.starts_with("\u{feff}Материал;"));
        Ok(())
    }
}
