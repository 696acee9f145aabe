//! Grid processing for the Aus400 archive.
//!
//! This crate holds the coordinate-transform core that operates on
//! [`Field`](aus400_common::Field)s:
//!
//! - **Grid identification**: which resolution and staggering a field is on
//! - **Cross-sections**: sampling along a path with a distance coordinate
//! - **Regridding**: applying precomputed weights between grids
//! - **Vertical interpolation**: model levels to pressure or height
//!
//! Archive access is abstracted behind [`DatasetLookup`] and
//! [`WeightsSource`] so the processors can run against in-memory data.
//!
//! # Architecture
//!
//! ```text
//! Field ──► identify_grid ──► Regridder ──► WeightsSource
//!   │                           │
//!   │                           └─► regrid_vector ──► DatasetLookup
//!   │
//!   ├─► cross_sec ──► deg_to_dist
//!   │                 interp_points
//!   │
//!   └─► VerticalInterpolator ──► DatasetLookup (pressure / height_rho)
//!                 │
//!                 ├─► cross_sec (cross-sectioned fields)
//!                 ├─► align_to
//!                 └─► VerticalGrid::transform
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{cross_sec, PointCount, Regridder, VerticalInterpolator};
//!
//! let regridder = Regridder::new(&weights, &catalogue, config.clone());
//! let theta = regridder.to_scalar_grid(&theta)?;
//!
//! let section = cross_sec(&theta, 130.0, -20.0, 135.0, -25.0, PointCount::Auto)?;
//! let on_plev = VerticalInterpolator::new(&catalogue, config)
//!     .to_pressure_levels(&section, &[85000.0, 50000.0])?;
//! ```

pub mod align;
pub mod config;
pub mod cross_section;
pub mod distance;
pub mod error;
pub mod identify;
pub mod interpolation;
pub mod regrid;
pub mod source;
pub mod types;
pub mod vertical;
pub mod weights;

// Re-export commonly used types at crate root
pub use align::align_to;
pub use config::GridProcessorConfig;
pub use cross_section::{cross_sec, cross_sec_along};
pub use distance::{deg_to_dist, EARTH_RADIUS_M};
pub use error::{GridProcessorError, Result};
pub use identify::{identify_grid, identify_resolution, identify_subgrid};
pub use interpolation::{interp_column, interp_points, interp_rectilinear};
pub use regrid::Regridder;
pub use source::{DatasetLookup, WeightsSource};
pub use types::{InterpolationMethod, PointCount};
pub use vertical::{VerticalGrid, VerticalInterpolator};
pub use weights::WeightsTable;
