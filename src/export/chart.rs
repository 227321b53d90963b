use crate::config::ChartConfig;
use crate::table::{Table, Value};
use anyhow::{anyhow, bail, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Bars to draw, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    /// Pair `label_key` with `value_key` for every row whose value is numeric.
    pub fn from_table(table: &Table, label_key: &str, value_key: &str) -> Result<Self> {
        let label_idx = table
            .column_index(label_key)
            .ok_or_else(|| anyhow!("chart label column {:?} is not in the table", label_key))?;
        let value_idx = table
            .column_index(value_key)
            .ok_or_else(|| anyhow!("chart value column {:?} is not in the table", value_key))?;

        let mut data = ChartData {
            labels: Vec::new(),
            values: Vec::new(),
        };
        for row in &table.rows {
            if let Value::Number(v) = row[value_idx] {
                data.labels.push(row[label_idx].to_string());
                data.values.push(v);
            }
        }
        debug!(bars = data.values.len(), rows = table.len(), "prepared chart data");
        Ok(data)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value axis range, always including zero.
    fn y_range(&self) -> (f64, f64) {
        let min = self.values.iter().copied().fold(0.0, f64::min);
        let max = self.values.iter().copied().fold(0.0, f64::max);
        let max = if max <= min { min + 1.0 } else { max };
        (min, max * 1.1)
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {}", e)
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &ChartData,
    options: &ChartConfig,
) -> Result<()> {
    root.fill(&WHITE).map_err(chart_err)?;

    let (y_min, y_max) = data.y_range();
    let bars = data.values.len() as u32;

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..bars).into_segmented(), y_min..y_max)
        .map_err(chart_err)?;

    let labels = &data.labels;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(data.values.len())
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc(&options.value_key)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.7).filled())
                .margin(6)
                .data(data.values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// The chart as an SVG document.
pub fn render_svg(data: &ChartData, options: &ChartConfig) -> Result<String> {
    if data.is_empty() {
        bail!("no numeric values to chart");
    }
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        draw_bars(&root, data, options)?;
    }
    Ok(svg)
}

/// Write the chart to `path`; `.png` renders a bitmap, anything else SVG.
pub fn save_chart(data: &ChartData, options: &ChartConfig, path: &Path) -> Result<()> {
    if data.is_empty() {
        bail!("no numeric values to chart");
    }
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
        draw_bars(&root, data, options)?;
    } else {
        let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
        draw_bars(&root, data, options)?;
    }
    info!(path = %path.display(), bars = data.values.len(), "wrote chart");
    Ok(())
}
