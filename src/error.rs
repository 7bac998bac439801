//! Error types for tabmatch operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabmatchError>;

#[derive(Error, Debug)]
pub enum TabmatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to enumerate files: {0}")]
    Enumeration(#[from] walkdir::Error),

    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl TabmatchError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Whether this error aborted the run before any comparison happened
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::RootNotFound { .. } | Self::InvalidInput { .. }
        )
    }
}

/// A single file could not be decoded into a table.
///
/// Always scoped to one file: the tree matcher turns it into a per-file
/// load error and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct DecodeError {
    pub detail: String,
}

impl DecodeError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<parquet::errors::ParquetError> for DecodeError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<csv::Error> for DecodeError {
    fn from(e: csv::Error) -> Self {
        Self::new(e.to_string())
    }
}
