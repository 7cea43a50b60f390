use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single forecast request. Never escapes the fetch stage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("malformed forecast payload: {0}")]
    Decode(String),
}

/// Raised when there is nothing to pick the best city from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no aggregated rows: none of the cities produced forecast data")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("no config file found; use --config or provide one at ./config/cities.yaml")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
