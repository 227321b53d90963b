// src/dashboard.rs

use crate::config::{ChartConfig, Config, DatasetConfig};
use crate::export::ChartData;
use crate::fetch::SheetSource;
use crate::normalize::normalize_table;
use crate::table::{materialize, retain_positive, Row, RowLimit, Table};
use anyhow::{anyhow, bail, Result};
use futures::future::join_all;
use tracing::{error, info};

/// What a dataset's fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Vec<Row>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DatasetState {
    pub config: DatasetConfig,
    pub outcome: LoadOutcome,
}

/// A dataset ready for display or export.
#[derive(Debug, Clone, PartialEq)]
pub enum TableView {
    Table(Table),
    /// Nothing to show; not an error.
    Message(String),
    Error(String),
}

impl TableView {
    pub fn table(&self) -> Option<&Table> {
        match self {
            TableView::Table(t) => Some(t),
            _ => None,
        }
    }
}

/// Fetched datasets, kept for every render and export of this run.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    datasets: Vec<DatasetState>,
}

async fn load_one(source: &SheetSource, config: &DatasetConfig) -> LoadOutcome {
    match source.fetch_table(&config.gid).await {
        Ok(raw) => {
            let rows = normalize_table(&raw);
            info!(dataset = %config.name, rows = rows.len(), "dataset loaded");
            LoadOutcome::Loaded(rows)
        }
        Err(e) => {
            error!(dataset = %config.name, error = %e, "dataset failed to load");
            LoadOutcome::Failed(e.to_string())
        }
    }
}

impl Dashboard {
    /// Fetch every configured dataset concurrently. A failing dataset is
    /// recorded as such and never affects the others.
    pub async fn load(source: &SheetSource, config: &Config) -> Self {
        let outcomes = join_all(config.datasets.iter().map(|ds| load_one(source, ds))).await;
        let datasets = config
            .datasets
            .iter()
            .cloned()
            .zip(outcomes)
            .map(|(config, outcome)| DatasetState { config, outcome })
            .collect();
        Self { datasets }
    }

    /// Build a dashboard from already-normalized rows.
    pub fn from_states(datasets: Vec<DatasetState>) -> Self {
        Self { datasets }
    }

    /// Fetch `name` again and replace its previous outcome.
    pub async fn reload(&mut self, source: &SheetSource, name: &str) -> Result<()> {
        let state = self
            .datasets
            .iter_mut()
            .find(|d| d.config.name == name)
            .ok_or_else(|| anyhow!("unknown dataset {:?}", name))?;
        state.outcome = load_one(source, &state.config).await;
        Ok(())
    }

    pub fn datasets(&self) -> &[DatasetState] {
        &self.datasets
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetState> {
        self.datasets.iter().find(|d| d.config.name == name)
    }

    pub fn view(&self, name: &str, limit: RowLimit) -> Option<TableView> {
        self.dataset(name).map(|d| d.view(limit))
    }

    /// Every dataset's view, in configuration order.
    pub fn views(&self, limit: RowLimit) -> Vec<(&DatasetConfig, TableView)> {
        self.datasets
            .iter()
            .map(|d| (&d.config, d.view(limit)))
            .collect()
    }

    /// Bars for `chart`, taken from the full (unlimited) table of its dataset.
    pub fn chart_data(&self, chart: &ChartConfig) -> Result<ChartData> {
        let view = self
            .view(&chart.dataset, RowLimit::All)
            .ok_or_else(|| anyhow!("unknown chart dataset {:?}", chart.dataset))?;
        match view {
            TableView::Table(table) => {
                ChartData::from_table(&table, &chart.label_key, &chart.value_key)
            }
            TableView::Message(msg) | TableView::Error(msg) => {
                bail!("chart dataset {:?} has no table: {}", chart.dataset, msg)
            }
        }
    }
}

impl DatasetState {
    pub fn view(&self, limit: RowLimit) -> TableView {
        let rows = match &self.outcome {
            LoadOutcome::Loaded(rows) => rows,
            LoadOutcome::Failed(_) => return TableView::Error(self.config.error_message.clone()),
        };

        let filtered;
        let rows: &[Row] = match &self.config.positive_only {
            Some(key) => {
                filtered = retain_positive(rows, key);
                if filtered.is_empty() && !rows.is_empty() {
                    if let Some(msg) = &self.config.empty_message {
                        return TableView::Message(msg.clone());
                    }
                }
                &filtered
            }
            None => rows,
        };

        let limit = if self.config.limit_rows {
            limit
        } else {
            RowLimit::All
        };
        match materialize(
            rows,
            &self.config.columns,
            self.config.unique_by.as_deref(),
            limit,
        ) {
            Ok(table) => TableView::Table(table),
            Err(empty) => TableView::Message(empty.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn balances() -> DatasetConfig {
        Config::default().dataset("balances").unwrap().clone()
    }

    fn transactions() -> DatasetConfig {
        Config::default().dataset("transactions").unwrap().clone()
    }

    fn row(material: &str, left: i32) -> Row {
        [("Материал", Value::from(material)), ("Остаток", Value::from(left))]
            .into_iter()
            .collect()
    }

    #[test]
    fn failed_dataset_shows_its_error_message() {
        let state = DatasetState {
            config: balances(),
            outcome: LoadOutcome::Failed("HTTP 404".into()),
        };
        assert_eq!(
            state.view(RowLimit::All),
            TableView::Error(balances().error_message)
        );
    }

    #[test]
    fn positive_filter_uses_empty_message() {
        let state = DatasetState {
            config: balances(),
            outcome: LoadOutcome::Loaded(vec![row("A", 0), row("B", -2)]),
        };
        assert_eq!(
            state.view(RowLimit::All),
            TableView::Message("В данный момент нет материалов на складе (остаток > 0).".into())
        );
    }

    #[test]
    fn positive_filter_keeps_stock() {
        let state = DatasetState {
            config: balances(),
            outcome: LoadOutcome::Loaded(vec![row("A", 3), row("B", 0)]),
        };
        let view = state.view(RowLimit::All);
        let table = view.table().unwrap();
        assert_eq!(table.len(), 1);
        let material = table.column_index("Материал").unwrap();
        assert_eq!(table.rows[0][material], Value::from("A"));
    }

    #[test]
    fn no_rows_message() {
        let state = DatasetState {
            config: transactions(),
            outcome: LoadOutcome::Loaded(vec![]),
        };
        assert_eq!(
            state.view(RowLimit::All),
            TableView::Message("Данные отсутствуют.".into())
        );
    }

    #[test]
    fn no_unique_rows_is_not_replaced_by_empty_message() {
        let mut config = Config::default().dataset("materials").unwrap().clone();
        config.empty_message = Some("Пусто".into());
        let nameless: Row = [("Название", Value::empty()), ("ID", Value::from(1))]
            .into_iter()
            .collect();
        let state = DatasetState {
            config,
            outcome: LoadOutcome::Loaded(vec![nameless]),
        };
        assert_eq!(
            state.view(RowLimit::All),
            TableView::Message("Нет уникальных данных по полю \"Материал\".".into())
        );
    }

    #[test]
    fn row_limit_only_where_enabled() {
        let rows: Vec<Row> = (1..=5).map(|i| row("X", i)).collect();
        let limited = DatasetState {
            config: transactions(),
            outcome: LoadOutcome::Loaded(rows.clone()),
        };
        let unlimited = DatasetState {
            config: balances(),
            outcome: LoadOutcome::Loaded(rows),
        };
        assert_eq!(limited.view(RowLimit::Last(2)).table().unwrap().len(), 2);
        assert_eq!(unlimited.view(RowLimit::Last(2)).table().unwrap().len(), 5);
    }

    #[test]
    fn chart_data_from_balances() {
        let config = Config::default();
        let dash = Dashboard::from_states(vec![DatasetState {
            config: balances(),
            outcome: LoadOutcome::Loaded(vec![row("A", 3), row("B", 0), row("C", 7)]),
        }]);
        let data = dash.chart_data(config.chart.as_ref().unwrap()).unwrap();
        assert_eq!(data.labels, vec!["A", "C"]);
        assert_eq!(data.values, vec![3.0, 7.0]);

        let failed = Dashboard::from_states(vec![DatasetState {
            config: balances(),
            outcome: LoadOutcome::Failed("boom".into()),
        }]);
        assert!(failed.chart_data(config.chart.as_ref().unwrap()).is_err());
    }

    #[test]
    fn views_follow_configuration_order() {
        let dash = Dashboard::from_states(vec![
            DatasetState {
                config: transactions(),
                outcome: LoadOutcome::Loaded(vec![]),
            },
            DatasetState {
                config: balances(),
                outcome: LoadOutcome::Failed("boom".into()),
            },
        ]);
        let names: Vec<&str> = dash
            .views(RowLimit::All)
            .iter()
            .map(|(c, _)| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["transactions", "balances"]);
        assert!(dash.view("nope", RowLimit::All).is_none());
    }
}
