use std::path::PathBuf;
use thiserror::Error;

/// Search errors / 搜索错误
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} responded with {status}")]
    Status { url: String, status: reqwest::StatusCode },
    #[error("Failed to render content of {permalink}: {message}")]
    Render { permalink: String, message: String },
    #[error("Missing option: {0}")]
    MissingOption(&'static str),
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
