use crate::config::DatasetConfig;
use crate::dashboard::TableView;
use crate::table::Table;
use std::fmt::Write;

pub(crate) const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;margin-bottom:2em}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
th{background:#f0f0f0}\
.error-message{color:#b00020}";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `<table>` with a header row of labels and one `<tr>` per row.
pub fn render_table(table: &Table, class: Option<&str>) -> String {
    let mut html = String::new();
    match class {
        Some(class) => {
            let _ = write!(html, "<table class=\"{}\">", escape(class));
        }
        None => html.push_str("<table>"),
    }

    html.push_str("<thead><tr>");
    for label in table.labels() {
        let _ = write!(html, "<th>{}</th>", escape(label));
    }
    html.push_str("</tr></thead><tbody>");

    for row in &table.rows {
        html.push_str("<tr>");
        for value in row {
            let _ = write!(html, "<td>{}</td>", escape(&value.to_string()));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// Heading plus the table, the empty-state message or the error message.
pub fn render_section(dataset: &DatasetConfig, view: &TableView) -> String {
    let body = match view {
        TableView::Table(table) => render_table(table, dataset.table_class.as_deref()),
        TableView::Message(msg) => format!("<p>{}</p>", escape(msg)),
        TableView::Error(msg) => format!("<p class=\"error-message\">{}</p>", escape(msg)),
    };
    format!(
        "<section id=\"{}\"><h2>{}</h2>{}</section>",
        escape(&dataset.name),
        escape(&dataset.title),
        body
    )
}

/// Full dashboard page: every dataset section, then the chart if any.
pub fn render_page(
    title: &str,
    views: &[(&DatasetConfig, TableView)],
    chart_svg: Option<&str>,
) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"ru\"><head><meta charset=\"utf-8\"><title>{t}</title>\
         <style>{STYLE}</style></head><body><h1>{t}</h1>",
        t = escape(title)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::table::{ColumnSpec, Value};

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn table_markup() {
        let table = Table {
            columns: vec![ColumnSpec::new("m", "Материал"), ColumnSpec::new("q", "Остаток")],
            rows: vec![vec![Value::from("<A>"), Value::from(5)]],
        };
        assert_eq!(
            render_table(&table, Some("balances-table")),
            "<table class=\"balances-table\"><thead><tr><th>Материал</th><th>Остаток</th></tr></thead>\
             <tbody><tr><td>&lt;A&gt;</td><td>5</td></tr></tbody></table>"
        );
    }

    #[test]
    fn sections_show_messages() {
        let config = Config::default();
        let ds = &config.datasets[0];
        let err = render_section(ds, &TableView::Error("Не удалось".into()));
        assert!(err.contains("<p class=\"error-message\">Не удалось</p>"));
        let msg = render_section(ds, &TableView::Message("Данные отсутствуют.".into()));
        assert!(msg.contains("<p>Данные отсутствуют.</p>"));
        assert!(msg.contains("<h2>Материалы</h2>"));
    }

    #[test]
    fn page_embeds_chart() {
        let config = Config::default();
        let views = vec![(&config.datasets[0], TableView::Message("x".into()))];
        let page = render_page("Склад", &views, Some("<svg></svg>"));
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h1>Склад</h1>"));
        assert!(page.contains("<section class=\"chart\"><svg></svg></section>"));
        assert!(page.ends_with("</body></html>"));
    }
}
