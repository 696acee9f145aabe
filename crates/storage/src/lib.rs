//! Archive access for the Aus400 tools.
//!
//! Provides the on-disk side of the grid processor's collaborators:
//! - [`Catalogue`]: the CSV catalogue of archive files, and loading of
//!   matching NetCDF files into fields ([`grid_processor::DatasetLookup`])
//! - [`ArchiveWeights`]: ESMF weights files behind an LRU cache
//!   ([`grid_processor::WeightsSource`])
//!
//! Both are built from an explicit [`ArchiveConfig`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod weights_store;

pub use catalog::{Catalogue, CatalogueEntry, CatalogueFilter};
pub use config::ArchiveConfig;
pub use error::{StorageError, StorageResult};
pub use weights_store::{ArchiveWeights, WeightsCacheStats};
