//! Regridding between the archive grids.
//!
//! Conversions between Aus400 grids, and to the external reference grid,
//! use precomputed weights tables. `regrid_vector` is a separate bilinear
//! path onto the coordinates of a reference scalar variable.

use std::borrow::Cow;

use aus400_common::{dims, DatasetQuery, Field, GridId};
use tracing::{debug, info};

use crate::config::GridProcessorConfig;
use crate::error::{GridProcessorError, Result};
use crate::identify::{identify_grid, identify_resolution};
use crate::interpolation::interp_rectilinear;
use crate::source::{DatasetLookup, WeightsSource};

/// Regrids fields using the archive's weights and reference variables.
pub struct Regridder<'a> {
    weights: &'a dyn WeightsSource,
    lookup: &'a dyn DatasetLookup,
    config: GridProcessorConfig,
}

impl<'a> Regridder<'a> {
    pub fn new(
        weights: &'a dyn WeightsSource,
        lookup: &'a dyn DatasetLookup,
        config: GridProcessorConfig,
    ) -> Self {
        Self {
            weights,
            lookup,
            config,
        }
    }

    pub fn config(&self) -> &GridProcessorConfig {
        &self.config
    }

    /// Regrid onto the 2.2 km scalar grid `d0198t`.
    ///
    /// Fields already on `d0198t` are returned unchanged.
    pub fn to_d0198t<'f>(&self, field: &'f Field) -> Result<Cow<'f, Field>> {
        let grid = identify_grid(field)?;
        if grid == GridId::D0198T {
            return Ok(Cow::Borrowed(field));
        }
        Ok(Cow::Owned(self.apply(field, &grid, &GridId::D0198T.to_string())?))
    }

    /// Regrid onto the external reanalysis grid.
    ///
    /// Weights are always applied, even at matching resolution, since the
    /// two grids are numerically distinct.
    pub fn to_reference_grid(&self, field: &Field) -> Result<Field> {
        let grid = identify_grid(field)?;
        self.apply(field, &grid, &self.config.reference_grid)
    }

    /// Destagger onto the scalar grid of the same resolution.
    ///
    /// Fields already on a `t` grid are returned unchanged.
    pub fn to_scalar_grid<'f>(&self, field: &'f Field) -> Result<Cow<'f, Field>> {
        let grid = identify_grid(field)?;
        if grid.is_scalar() {
            return Ok(Cow::Borrowed(field));
        }
        Ok(Cow::Owned(self.apply(field, &grid, &grid.scalar().to_string())?))
    }

    /// Bilinearly interpolate a staggered field onto the scalar grid.
    ///
    /// The target coordinates are taken from a reference scalar variable
    /// clipped to the field's extent. Length-one dimensions are removed for
    /// the interpolation and restored afterwards.
    pub fn regrid_vector(&self, field: &Field) -> Result<Field> {
        let resolution = identify_resolution(field)?;
        let query = DatasetQuery::new(
            resolution,
            self.config.vector_reference_stream.as_str(),
            self.config.vector_reference_variable.as_str(),
        );
        info!(%query, "Loading reference grid for vector regridding");
        let reference = self.lookup.load(&query)?;

        let bbox = field
            .bbox()
            .ok_or_else(|| GridProcessorError::unknown_grid("field has no latitude/longitude coordinates"))?;
        let reference = reference
            .sel_range(dims::LONGITUDE, bbox.min_lon, bbox.max_lon)?
            .sel_range(dims::LATITUDE, bbox.min_lat, bbox.max_lat)?;
        let lats = reference.require_coord(dims::LATITUDE)?.to_vec();
        let lons = reference.require_coord(dims::LONGITUDE)?.to_vec();

        let (squeezed, dropped) = field.squeeze()?;
        if !squeezed.has_dim(dims::LATITUDE) || !squeezed.has_dim(dims::LONGITUDE) {
            return Err(GridProcessorError::shape_mismatch(format!(
                "'{}' needs more than one point along latitude and longitude",
                field.name()
            )));
        }

        let regridded = interp_rectilinear(&squeezed, &lats, &lons)?.unsqueeze(&dropped)?;
        debug!(
            field = field.name(),
            grid = %GridId::new(resolution, aus400_common::Stagger::T),
            lats = lats.len(),
            lons = lons.len(),
            "Regridded vector component"
        );
        Ok(regridded.with_attr("resolution", resolution.to_string()))
    }

    fn apply(&self, field: &Field, source: &GridId, target: &str) -> Result<Field> {
        let table = self.weights.load_weights(source, target)?;
        let mut out = table.apply(field)?.with_attr("grid", target);
        if let Ok(target_grid) = target.parse::<GridId>() {
            out = out.with_attr("resolution", target_grid.resolution.to_string());
        }
        info!(field = field.name(), %source, target_grid = target, "Regridded");
        Ok(out)
    }
}
