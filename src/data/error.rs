use std::path::PathBuf;

use thiserror::Error;

use super::model::Value;

/// Errors raised by the data layer.
///
/// `NotFound` is recoverable: callers show "no data" instead of aborting.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading parquet file: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("reading arrow record batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Malformed(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: unrecognized outcome value '{value}'")]
    DataFormat { row: usize, value: Value },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("unsupported encoding '{0}' (expected utf-8 or utf-8-sig)")]
    UnsupportedEncoding(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DataError {
    /// Whether the error means "there is no data to show".
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound { .. })
    }
}

pub type Result<T, E = DataError> = std::result::Result<T, E>;
