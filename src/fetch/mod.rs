// src/fetch/mod.rs

use crate::config::Config;
use crate::error::SourceError;
use crate::sheet::{PayloadFormat, RawTable};
use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

pub mod urls;

/// The published spreadsheet every dataset is read from.
#[derive(Debug, Clone)]
pub struct SheetSource {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    format: PayloadFormat,
}

impl SheetSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: urls::parse_base(&config.base_url)?,
            spreadsheet_id: config.spreadsheet_id.clone(),
            format: config.payload,
        })
    }

    pub fn dataset_url(&self, gid: &str) -> Url {
        urls::dataset_url(&self.base_url, &self.spreadsheet_id, gid, self.format)
    }

    /// GET one sheet and decode it. One attempt, no retries.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_table(&self, gid: &str) -> Result<RawTable, SourceError> {
        let url = self.dataset_url(gid);
        let body = get_text(&self.client, &url).await?;
        let table = self.format.parse(&body)?;
        info!(rows = table.rows.len(), columns = table.headers.len(), "fetched sheet");
        Ok(table)
    }
}

async fn get_text(client: &Client, url: &Url) -> Result<String, SourceError> {
    debug!("Fetching text from {}", url);
    let transport = |source| SourceError::Transport {
        url: url.to_string(),
        source,
    };
    let resp = client.get(url.clone()).send().await.map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status,
        });
    }
    resp.text().await.map_err(transport)
}
