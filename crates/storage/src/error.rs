//! Error types for archive storage.

use aus400_common::time::TimeParseError;
use aus400_common::{FieldError, LookupError};
use netcdf_parser::NetCdfError;
use thiserror::Error;

/// Result type alias using StorageError.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalogue CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid catalogue row: {0}")]
    InvalidRow(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("configuration YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid weights file {file}: {reason}")]
    InvalidWeights { file: String, reason: String },

    #[error("weights cache lock poisoned")]
    CachePoisoned,

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] NetCdfError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl StorageError {
    pub(crate) fn invalid_row(line: usize, msg: impl std::fmt::Display) -> Self {
        Self::InvalidRow(format!("line {}: {}", line, msg))
    }
}

impl From<TimeParseError> for StorageError {
    fn from(err: TimeParseError) -> Self {
        Self::InvalidRow(err.to_string())
    }
}

impl From<StorageError> for LookupError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Lookup(inner) => inner,
            other => LookupError::Read(other.to_string()),
        }
    }
}
