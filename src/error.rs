//! Error types for the allocation optimizer.

use thiserror::Error;

/// Main error type for the optimizer.
#[derive(Error, Debug)]
pub enum NiveshError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl NiveshError {
    /// Whether the error means there was not enough history to fit a risk model.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, NiveshError::InsufficientData(_))
    }
}

/// Result type alias for optimizer operations.
pub type Result<T> = std::result::Result<T, NiveshError>;
