pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod fetch;
pub mod normalize;
pub mod sheet;
pub mod table;

pub use config::Config;
pub use dashboard::{Dashboard, TableView};
pub use error::SourceError;
pub use fetch::SheetSource;
pub use table::{materialize, ColumnSpec, EmptyTable, Row, RowLimit, Table, Value};
