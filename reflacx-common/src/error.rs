//! Common error types for REFLACX tooling

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for REFLACX operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across REFLACX crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited table could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON document could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// Session record does not reference the requested auxiliary file
    #[error("Session has no '{key}' file")]
    MissingFile { key: String },

    /// Row or record lacks a required field
    #[error("Missing field: {field}")]
    MissingField { field: String },

    /// Value present but not usable
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn missing_file(key: impl Into<String>) -> Self {
        Error::MissingFile { key: key.into() }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField { field: field.into() }
    }
}
