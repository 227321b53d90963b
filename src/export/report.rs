use super::html::{escape, render_section, STYLE};
use crate::config::DatasetConfig;
use crate::dashboard::TableView;
use chrono::{DateTime, Local};
use std::fmt::Write;

const PRINT_STYLE: &str = "@page{size:A4 portrait;margin:10mm}\
@media print{body{margin:0}table{page-break-inside:auto}tr{page-break-inside:avoid}\
section{page-break-after:auto}.chart{page-break-before:always}}\
.generated{color:#666;font-size:small}";

/// Printable snapshot of the dashboard: every section plus the chart, laid
/// out for A4 pages.
pub fn render_report(
    title: &str,
    views: &[(&DatasetConfig, TableView)],
    chart_svg: Option<&str>,
    generated_at: DateTime<Local>,
) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"ru\"><head><meta charset=\"utf-8\"><title>{t}</title>\
         <style>{STYLE}{PRINT_STYLE}</style></head><body><h1>{t}</h1>\
         <p class=\"generated\">{when}</p>",
        t = escape(title),
        when = generated_at.format("%d.%m.%Y %H:%M:%S"),
    );
    for (dataset, view) in views {
        html.push_str(&render_section(dataset, view));
    }
    if let Some(svg) = chart_svg {
        let _ = write!(html, "<section class=\"chart\">{}</section>", svg);
    }
    html.push_str("</body></html>");
    html
}
