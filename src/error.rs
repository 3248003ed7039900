//! Error types for the simulator and optimizer.

use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum DcaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("No data loaded")]
    NoData,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias for simulator and optimizer operations.
pub type Result<T> = std::result::Result<T, DcaError>;
