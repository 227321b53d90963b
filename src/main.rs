use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf};
use stockview::{
    config::Config,
    export::{self, html::render_page, ChartData},
    Dashboard, RowLimit, SheetSource, TableView,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Warehouse dashboard: fetch published sheets, render and export them"
)]
struct Args {
    /// YAML config; built-in datasets when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, env = "STOCKVIEW_SPREADSHEET_ID")]
    spreadsheet_id: Option<String>,
    /// Trailing rows to keep for row-limited datasets: a number or "all".
    #[arg(long)]
    rows: Option<RowLimit>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print materialized tables as JSON.
    Show {
        #[arg(long)]
        dataset: Option<String>,
    },
    /// Dashboard page with every table and the chart.
    Html {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// One BOM-prefixed delimited file per dataset.
    Csv {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Multi-sheet workbook.
    Xlsx {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Bar chart, `.svg` or `.png`.
    Chart {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Printable A4 snapshot of tables and chart.
    Report {
        #[arg(short, long)]
        out: PathBuf,
    },
}

/// Chart SVG for the page and the report; a failing chart only drops the chart.
fn chart_svg(dashboard: &Dashboard, config: &Config) -> Option<String> {
    let chart = config.chart.as_ref()?;
    match dashboard
        .chart_data(chart)
        .and_then(|data| export::render_svg(&data, chart))
    {
        Ok(svg) => Some(svg),
        Err(e) => {
            warn!(error = %e, "chart skipped");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) configure ────────────────────────────────────────────────
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(id) = args.spreadsheet_id {
        config.spreadsheet_id = id;
    }
    if let Some(rows) = args.rows {
        config.row_limit = rows;
    }
    // overrides bypass the check done in Config::load
    config.validate()?;
    let limit = config.row_limit;

    // ─── 3) fetch every dataset ──────────────────────────────────────
    let source = SheetSource::new(&config)?;
    info!(datasets = config.datasets.len(), "loading");
    let dashboard = Dashboard::load(&source, &config).await;

    // ─── 4) render / export ──────────────────────────────────────────
    match args.command {
        Command::Show { dataset } => {
            let views = match dataset {
                Some(name) => {
                    let Some(ds) = dashboard.dataset(&name) else {
                        bail!("unknown dataset {:?}", name);
                    };
                    vec![(&ds.config, ds.view(limit))]
                }
                None => dashboard.views(limit),
            };
            for (ds, view) in views {
                let json = match &view {
                    TableView::Table(table) => serde_json::to_string_pretty(table)?,
                    TableView::Message(msg) | TableView::Error(msg) => {
                        serde_json::to_string(msg)?
                    }
                };
                println!("# {}\n{}", ds.title, json);
            }
        }
        Command::Html { out } => {
            let svg = chart_svg(&dashboard, &config);
            let page = render_page(&config.page_title, &dashboard.views(limit), svg.as_deref());
            fs::write(&out, page).with_context(|| format!("writing {}", out.display()))?;
            info!(path = %out.display(), "wrote dashboard page");
        }
        Command::Csv { dir } => {
            let written =
                export::write_csv_files(&dir, &dashboard.views(limit), config.delimiter_byte()?)?;
            if written.is_empty() {
                bail!("no dataset has data to export");
            }
        }
        Command::Xlsx { out } => {
            let bytes = export::to_xlsx(&dashboard.views(limit))?;
            fs::write(&out, bytes).with_context(|| format!("writing {}", out.display()))?;
            info!(path = %out.display(), "wrote workbook");
        }
        Command::Chart { out } => {
            let Some(chart) = config.chart.as_ref() else {
                bail!("no chart configured");
            };
            let data: ChartData = dashboard.chart_data(chart)?;
            export::save_chart(&data, chart, &out)?;
        }
        Command::Report { out } => {
            let svg = chart_svg(&dashboard, &config);
            let html = export::render_report(
                &config.page_title,
                &dashboard.views(limit),
                svg.as_deref(),
                chrono::Local::now(),
            );
            fs::write(&out, html).with_context(|| format!("writing {}", out.display()))?;
            info!(path = %out.display(), "wrote report");
        }
    }

    Ok(())
}
