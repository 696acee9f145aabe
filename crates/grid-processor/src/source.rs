//! Collaborators that supply archive data to the processors.

use std::sync::Arc;

use aus400_common::{DatasetQuery, Field, GridId, LookupError};

use crate::weights::WeightsTable;

/// Resolves a dataset query to a loaded field.
pub trait DatasetLookup {
    /// Load the single dataset matching `query`.
    ///
    /// Fails with [`LookupError::AmbiguousSelection`] when the query matches
    /// several variables and [`LookupError::EmptySelection`] when it matches
    /// none.
    fn load(&self, query: &DatasetQuery) -> Result<Field, LookupError>;
}

/// Provides precomputed regridding weights.
pub trait WeightsSource {
    /// Weights mapping grid `source` onto the grid named `target`.
    fn load_weights(&self, source: &GridId, target: &str)
        -> Result<Arc<WeightsTable>, LookupError>;
}
