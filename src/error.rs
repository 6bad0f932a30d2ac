use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared across CSV and Excel ingestion. Every variant describes
/// a problem with the uploaded content (or its name), never with the server.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The filename extension is not accepted for the requested format.
    #[error("unsupported file '{filename}': expected one of {expected}")]
    UnsupportedExtension { filename: String, expected: String },

    /// Workbook decoding error.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV tokenizer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The tabular engine rejected the content.
    #[error("{0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// The bytes are not valid text in the requested encoding, or the encoding is unknown.
    #[error("encoding error: {message}")]
    Encoding { message: String },

    /// The content decoded but does not form a table (no sheets, missing header row,
    /// ragged rows, ...).
    #[error("invalid layout: {message}")]
    InvalidLayout { message: String },
}

/// Error returned when the caller-supplied column mapping cannot be used.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The mapping parameter is not valid JSON.
    #[error("invalid mapping JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The mapping parameter is valid JSON but not an object.
    #[error("invalid mapping JSON: mapping JSON must be an object, got {found}")]
    NotAnObject { found: &'static str },
}

/// Error returned when the service configuration cannot be built from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used.
    #[error("invalid value for {key}: '{value}' ({message})")]
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}
