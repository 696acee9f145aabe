//! Error types for grid processing.

use aus400_common::{FieldError, GridId, LookupError};
use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Cross-section start and end points are identical.
    #[error("cross-section start and end points are identical ({x}, {y})")]
    InvalidEndpoints { x: f64, y: f64 },

    /// A fixed point count of zero was requested.
    #[error("cross-section needs at least one point, got {0}")]
    InvalidPointCount(usize),

    /// The cross-section segment does not pass through the data.
    #[error("cross-section from ({x0}, {y0}) to ({x1}, {y1}) does not intersect the data")]
    EmptyCrossSection { x0: f64, y0: f64, x1: f64, y1: f64 },

    /// Coordinate spacing matches no known resolution.
    #[error("unable to identify grid: {0}")]
    UnknownGrid(String),

    /// The operation needs a scalar grid.
    #[error("field is on grid {grid}, which is not a scalar grid; destagger it with to_scalar_grid first")]
    WrongGrid { grid: GridId },

    /// No weights file exists for the requested pair of grids.
    #[error("no regridding weights from {source_grid} to {target_grid}")]
    MissingWeights {
        source_grid: String,
        target_grid: String,
    },

    /// The dataset lookup failed.
    #[error(transparent)]
    Lookup(LookupError),

    /// Field construction or selection failed.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Field shape does not match what the operation expects.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A required dimension is absent.
    #[error("field has no '{0}' dimension")]
    MissingDimension(String),

    /// Two fields could not be aligned.
    #[error("cannot align fields: {0}")]
    Alignment(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GridProcessorError {
    /// Create an UnknownGrid error.
    pub fn unknown_grid(msg: impl Into<String>) -> Self {
        Self::UnknownGrid(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an Alignment error.
    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }

    pub fn missing_dimension(dim: impl Into<String>) -> Self {
        Self::MissingDimension(dim.into())
    }
}

impl From<LookupError> for GridProcessorError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::MissingWeights {
                source_grid,
                target_grid,
            } => Self::MissingWeights {
                source_grid,
                target_grid,
            },
            other => Self::Lookup(other),
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
