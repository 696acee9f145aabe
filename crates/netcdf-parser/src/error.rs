//! Error types for NetCDF parsing operations.

use aus400_common::FieldError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// The values read do not form a consistent field
    #[error("Invalid field: {0}")]
    Field(#[from] FieldError),
}

impl NetCdfError {
    pub(crate) fn netcdf(context: impl std::fmt::Display, err: netcdf::Error) -> Self {
        Self::InvalidFormat(format!("{}: {}", context, err))
    }
}
