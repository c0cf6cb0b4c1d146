//! Error types for Health Digest

use thiserror::Error;

use crate::types::Category;

/// Errors that can occur while reading sources or deriving metrics
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0} data file not found: {1}")]
    SourceUnavailable(Category, String),

    #[error("Failed to connect to data source: {0}")]
    Connect(String),

    #[error("No {0} data found")]
    NoUsableRecords(Category),

    #[error("Invalid {category} value in column {column:?}: {value:?}")]
    InvalidValue {
        category: Category,
        column: String,
        value: String,
    },

    #[error("Unrecognised duration: {0:?}")]
    InvalidDuration(String),

    #[error("Failed to parse response: {0}")]
    Response(String),

    #[error("No health data was successfully processed")]
    NoData,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
