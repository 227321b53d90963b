// src/config.rs

use crate::sheet::PayloadFormat;
use crate::table::{ColumnSpec, RowLimit};
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::HashSet, fs, path::Path, time::Duration};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";
pub const DEFAULT_SPREADSHEET_ID: &str = "138AarGc1IgO2AQwxQ4b2I62zqd-6re63VWZAh55TTn4";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spreadsheet_id: String,
    pub base_url: String,
    pub payload: PayloadFormat,
    pub request_timeout_secs: u64,
    pub csv_delimiter: char,
    #[serde(
        serialize_with = "serialize_row_limit",
        deserialize_with = "deserialize_row_limit"
    )]
    pub row_limit: RowLimit,
    pub page_title: String,
    pub datasets: Vec<DatasetConfig>,
    pub chart: Option<ChartConfig>,
}

/// One logical table of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub title: String,
    pub gid: String,
    /// File stem for CSV export and worksheet name for XLSX.
    pub export_name: String,
    #[serde(default)]
    pub table_class: Option<String>,
    #[serde(default)]
    pub unique_by: Option<String>,
    /// Keep only rows whose value under this key is a number above zero.
    #[serde(default)]
    pub positive_only: Option<String>,
    /// Whether the global row limit applies to this dataset.
    #[serde(default)]
    pub limit_rows: bool,
    #[serde(default = "default_error_message")]
    pub error_message: String,
    #[serde(default)]
    pub empty_message: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub dataset: String,
    pub label_key: String,
    pub value_key: String,
    #[serde(default = "default_chart_title")]
    pub title: String,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

fn default_error_message() -> String {
    "Не удалось загрузить данные. Проверьте URL или настройки публикации.".into()
}

fn default_chart_title() -> String {
    "Остатки на складе".into()
}

fn default_chart_width() -> u32 {
    960
}

fn default_chart_height() -> u32 {
    480
}

fn serialize_row_limit<S: Serializer>(limit: &RowLimit, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(limit)
}

fn deserialize_row_limit<'de, D: Deserializer<'de>>(d: D) -> Result<RowLimit, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    let text = match Raw::deserialize(d)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    };
    text.parse().map_err(serde::de::Error::custom)
}

fn columns(pairs: &[(&str, &str)]) -> Vec<ColumnSpec> {
    pairs.iter().map(|(k, l)| ColumnSpec::new(*k, *l)).collect()
}

impl Default for Config {
    fn default() -> Self {
        let datasets = vec![
            DatasetConfig {
                name: "materials".into(),
                title: "Материалы".into(),
                gid: "0".into(),
                export_name: "Материалы".into(),
                table_class: Some("materials-table".into()),
                unique_by: Some("Название".into()),
                positive_only: None,
                limit_rows: false,
                error_message:
                    "Не удалось загрузить данные о материалах. Проверьте URL или настройки публикации."
                        .into(),
                empty_message: None,
                columns: columns(&[
                    ("ID", "ID"),
                    ("Название", "Материал"),
                    ("Ед.изм.", "Ед.изм."),
                    ("Кол-во на складе", "Кол-во на складе"),
                    ("Остаток", "Остаток"),
                    ("Оповещение", "Оповещение"),
                ]),
            },
            DatasetConfig {
                name: "balances".into(),
                title: "Движение материалов".into(),
                gid: "1133040566".into(),
                export_name: "ДвижениеМатериалов".into(),
                table_class: Some("balances-table".into()),
                unique_by: None,
                positive_only: Some("Остаток".into()),
                limit_rows: false,
                error_message:
                    "Не удалось загрузить данные об остатках. Проверьте URL или настройки публикации."
                        .into(),
                empty_message: Some(
                    "В данный момент нет материалов на складе (остаток > 0).".into(),
                ),
                columns: columns(&[
                    ("ID", "ID"),
                    ("Материал", "Материал"),
                    ("Наличие (принято по акту ед.)", "Кол-во на складе"),
                    ("Приход", "Приход"),
                    ("Расход", "Расход"),
                    ("Списание", "Списание"),
                    ("Возврат", "Возврат"),
                    ("Остаток", "Остаток"),
                ]),
            },
            DatasetConfig {
                name: "transactions".into(),
                title: "Транзакции".into(),
                gid: "224436106".into(),
                export_name: "Транзакции".into(),
                table_class: Some("transactions-table".into()),
                unique_by: None,
                positive_only: None,
                limit_rows: true,
                error_message:
                    "Не удалось загрузить данные о транзакциях. Проверьте URL или настройки публикации."
                        .into(),
                empty_message: None,
                columns: columns(&[
                    ("Дата", "Дата"),
                    ("Сотрудник", "Сотрудник"),
                    ("Поставщик", "Поставщик"),
                    ("Материал", "Материал"),
                    ("Тип", "Тип"),
                    ("Кол-во", "Кол-во"),
                    ("Комментарий", "Комментарий"),
                ]),
            },
        ];

        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.into(),
            base_url: DEFAULT_BASE_URL.into(),
            payload: PayloadFormat::Json,
            request_timeout_secs: 30,
            csv_delimiter: ';',
            row_limit: RowLimit::All,
            page_title: "Склад".into(),
            datasets,
            chart: Some(ChartConfig {
                dataset: "balances".into(),
                label_key: "Материал".into(),
                value_key: "Остаток".into(),
                title: default_chart_title(),
                width: default_chart_width(),
                height: default_chart_height(),
            }),
        }
    }
}

impl Config {
    /// Read a YAML config from `path`, or fall back to the built-in one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                let config: Config = if text.trim().is_empty() {
                    Config::default()
                } else {
                    serde_yaml::from_str(&text)
                        .with_context(|| format!("parsing config {}", path.display()))?
                };
                debug!(path = %path.display(), datasets = config.datasets.len(), "loaded config");
                config
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.spreadsheet_id.trim().is_empty(), "spreadsheet_id is empty");
        self.delimiter_byte()?;

        let mut names = HashSet::new();
        for ds in &self.datasets {
            ensure!(names.insert(ds.name.as_str()), "duplicate dataset name {:?}", ds.name);
            let mut keys = HashSet::new();
            for col in &ds.columns {
                ensure!(
                    keys.insert(col.key.as_str()),
                    "dataset {:?} lists column {:?} twice",
                    ds.name,
                    col.key
                );
            }
        }

        if let Some(chart) = &self.chart {
            ensure!(
                names.contains(chart.dataset.as_str()),
                "chart refers to unknown dataset {:?}",
                chart.dataset
            );
            ensure!(chart.width > 0 && chart.height > 0, "chart size must be positive");
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        match u8::try_from(self.csv_delimiter) {
            Ok(b) if b.is_ascii() && !matches!(b, b'"' | b'\n' | b'\r') => Ok(b),
            _ => bail!("csv_delimiter {:?} must be a single ASCII character", self.csv_delimiter),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.name == name)
    }
}
