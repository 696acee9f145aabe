//! NetCDF readers for the Aus400 archive.
//!
//! Archive files are NetCDF-4 (HDF5) with one variable per file on
//! `latitude`/`longitude` axes, optionally with `time`,
//! `model_level_number` and ensemble dimensions. Two kinds of file are read:
//!
//! - **Fields**: [`read_field`] unpacks a variable and its coordinates into
//!   an [`aus400_common::Field`]
//! - **Weights**: [`read_esmf_weights`] reads the precomputed ESMF sparse
//!   matrices used for regridding
//!
//! # Implementation Notes
//!
//! Files are read with the native `netcdf` library, which requires
//! libhdf5-dev and libnetcdf-dev. HDF5 diagnostics are silenced on first
//! use, see [`silence_hdf5_errors`].

pub mod error;
pub mod esmf;
pub mod field;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use esmf::{read_esmf_weights, EsmfWeights};
pub use field::read_field;
pub use native::silence_hdf5_errors;
