//! Error types shared across the Aus400 crates.

use thiserror::Error;

/// Result type alias using FieldError.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised while building or slicing a [`crate::Field`].
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("field has {ndim} axes but {names} dimension names")]
    DimensionCount { ndim: usize, names: usize },

    #[error("duplicate dimension name: {0}")]
    DuplicateDimension(String),

    #[error("dimension not found: {0}")]
    MissingDimension(String),

    #[error("coordinate not found: {0}")]
    MissingCoordinate(String),

    #[error("coordinate '{name}' has {actual} values, dimension '{dim}' has length {expected}")]
    CoordinateLength {
        name: String,
        dim: String,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} out of range for dimension '{dim}' of length {len}")]
    IndexOutOfRange { dim: String, index: usize, len: usize },

    #[error("cannot combine fields: {0}")]
    Incompatible(String),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Errors reported by the dataset-lookup and weights-storage collaborators.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The query matched several distinct variables.
    #[error("selection contains multiple results ({0}), refine the query or load them all")]
    AmbiguousSelection(String),

    /// The query matched nothing in the catalogue.
    #[error("selection is empty: {0}")]
    EmptySelection(String),

    /// No precomputed weights exist for the grid pair.
    #[error("no weights available to regrid '{source_grid}' to '{target_grid}'")]
    MissingWeights {
        source_grid: String,
        target_grid: String,
    },

    /// The archive content could not be read.
    #[error("failed to read archive data: {0}")]
    Read(String),
}
