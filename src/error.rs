use reqwest::StatusCode;
use thiserror::Error;

/// Failure to obtain one dataset. Terminal for that dataset only.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid delimited payload: {0}")]
    Csv(#[from] csv::Error),
}
