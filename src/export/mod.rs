// src/export/mod.rs

pub mod chart;
pub mod csv;
pub mod html;
pub mod report;
pub mod xlsx;

pub use self::chart::{render_svg, save_chart, ChartData};
pub use self::csv::{to_csv, write_csv_files};
pub use self::html::{render_page, render_table};
pub use self::report::render_report;
pub use self::xlsx::to_xlsx;
