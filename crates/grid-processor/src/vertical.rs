//! Vertical interpolation from model levels to physical levels.
//!
//! Each column of a field on `model_level_number` is interpolated against
//! the matching column of a source-level field (pressure, height) onto a
//! fixed set of target levels.

use aus400_common::time::hourly_window;
use aus400_common::{dims, DatasetQuery, Field, Selection};
use ndarray::{ArrayD, Axis, IxDyn};
use tracing::{debug, info};

use crate::align::align_to;
use crate::config::GridProcessorConfig;
use crate::cross_section::cross_sec_along;
use crate::error::{GridProcessorError, Result};
use crate::identify::identify_grid;
use crate::interpolation::{carry_metadata, interp_column};
use crate::source::DatasetLookup;

/// Stream and variable of model-level pressure.
const PRESSURE: (&str, &str) = ("mdl", "pressure");

/// Stream and variable of model-level height above sea level.
const HEIGHT: (&str, &str) = ("fx", "height_rho");

/// Margin when clipping the source to the field's bounding box, in degrees.
const CLIP_MARGIN: f64 = 1e-6;

/// The model-level axis of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalGrid {
    axis: usize,
    levels: Vec<f64>,
}

impl VerticalGrid {
    pub fn from_field(field: &Field) -> Result<Self> {
        let axis = field
            .axis(dims::MODEL_LEVEL)
            .ok_or_else(|| GridProcessorError::missing_dimension(dims::MODEL_LEVEL))?;
        let levels = match field.dim_coord(dims::MODEL_LEVEL) {
            Some(values) => values.to_vec(),
            None => (1..=field.shape()[axis]).map(|l| l as f64).collect(),
        };
        Ok(Self { axis, levels })
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Interpolate `field` onto `targets` of the level variable `source`.
    ///
    /// `source` must already have the shape of `field`. The model-level
    /// axis is replaced in place by an axis named `target_dim`.
    pub fn transform(
        &self,
        field: &Field,
        source: &ArrayD<f64>,
        target_dim: &str,
        targets: &[f64],
    ) -> Result<Field> {
        if source.shape() != field.shape() {
            return Err(GridProcessorError::shape_mismatch(format!(
                "level source has shape {:?}, '{}' has {:?}",
                source.shape(),
                field.name(),
                field.shape()
            )));
        }

        let axis = Axis(self.axis);
        let mut flat = Vec::with_capacity(field.data().len() / self.levels.len().max(1) * targets.len());
        for (values, levels) in field.data().lanes(axis).into_iter().zip(source.lanes(axis)) {
            let values: Vec<f64> = values.iter().copied().collect();
            let levels: Vec<f64> = levels.iter().copied().collect();
            flat.extend(interp_column(&levels, &values, targets));
        }

        // Lanes come out in row-major order of the other axes
        let mut shape: Vec<usize> = field.shape().to_vec();
        shape.remove(self.axis);
        shape.push(targets.len());
        let ndim = shape.len();
        let mut perm: Vec<usize> = (0..self.axis).collect();
        perm.push(ndim - 1);
        perm.extend(self.axis..ndim - 1);

        let data = ArrayD::from_shape_vec(IxDyn(&shape), flat)
            .map_err(aus400_common::FieldError::from)?
            .permuted_axes(IxDyn(&perm))
            .as_standard_layout()
            .into_owned();

        let mut out_dims = field.dims().to_vec();
        out_dims[self.axis] = target_dim.to_string();
        let out = Field::new(field.name(), out_dims, data)?;
        let out = carry_metadata(field, out, &[dims::MODEL_LEVEL])?;
        Ok(out.with_coord(target_dim, target_dim, targets.to_vec())?)
    }
}

/// Re-levels model-level fields onto pressure or height levels.
pub struct VerticalInterpolator<'a> {
    lookup: &'a dyn DatasetLookup,
    config: GridProcessorConfig,
}

impl<'a> VerticalInterpolator<'a> {
    pub fn new(lookup: &'a dyn DatasetLookup, config: GridProcessorConfig) -> Self {
        Self { lookup, config }
    }

    /// Interpolate a scalar-grid field to pressure levels in Pa.
    pub fn to_pressure_levels(&self, field: &Field, levels: &[f64]) -> Result<Field> {
        let resolution = require_scalar_grid(field)?;
        let mut query = DatasetQuery::new(resolution, PRESSURE.0, PRESSURE.1);

        if let Some(times) = field.times().filter(|t| !t.is_empty()) {
            let (start, end) = hourly_window(times[0], times[times.len() - 1]);
            query = query.with_time(Selection::Range(start, end));
        }
        if let Some(members) = field.coord_values(dims::ENSEMBLE).filter(|e| !e.is_empty()) {
            let first = members[0].round() as i64;
            let last = members[members.len() - 1].round() as i64;
            query = query.with_ensemble(Selection::Range(first, last));
        }

        info!(%query, "Loading model-level pressure");
        let pressure = self.lookup.load(&query)?;
        self.vertical_interp(field, &pressure, levels)
    }

    /// Interpolate a scalar-grid field to heights above sea level in m.
    pub fn to_height_levels(&self, field: &Field, levels: &[f64]) -> Result<Field> {
        let resolution = require_scalar_grid(field)?;
        let query = DatasetQuery::new(resolution, HEIGHT.0, HEIGHT.1);

        info!(%query, "Loading model-level height");
        let height = self.lookup.load(&query)?;
        self.vertical_interp(field, &height, levels)
    }

    /// Interpolate `field` onto `levels` of the level variable `source`.
    ///
    /// The source is first cut down to the horizontal extent of the field:
    /// a cross-section is repeated on it, otherwise it is clipped to the
    /// field's bounding box. The output axis is named after `source`.
    pub fn vertical_interp(&self, field: &Field, source: &Field, levels: &[f64]) -> Result<Field> {
        let grid = VerticalGrid::from_field(field)?;
        let source = self.match_slice(field, source)?;
        let (field, source_data) = align_to(field, &source)?;

        debug!(
            field = field.name(),
            source = source.name(),
            columns = field.data().len() / grid.levels().len().max(1),
            targets = levels.len(),
            "Interpolating to vertical levels"
        );
        grid.transform(&field, &source_data, source.name(), levels)
    }

    fn match_slice(&self, field: &Field, source: &Field) -> Result<Field> {
        if let Some(section) = field.section().filter(|_| field.has_dim(dims::HORIZONTAL)) {
            return cross_sec_along(source, section, self.config.interpolation);
        }

        let mut clipped = source.clone();
        if let Some(bbox) = field.bbox() {
            if clipped.has_dim(dims::LONGITUDE) {
                clipped = clipped.sel_range(
                    dims::LONGITUDE,
                    bbox.min_lon - CLIP_MARGIN,
                    bbox.max_lon + CLIP_MARGIN,
                )?;
            }
            if clipped.has_dim(dims::LATITUDE) {
                clipped = clipped.sel_range(
                    dims::LATITUDE,
                    bbox.min_lat - CLIP_MARGIN,
                    bbox.max_lat + CLIP_MARGIN,
                )?;
            }
        }
        Ok(clipped)
    }
}

/// Resolution of `field`, failing unless it is on a scalar grid.
fn require_scalar_grid(field: &Field) -> Result<aus400_common::Resolution> {
    let grid = identify_grid(field)?;
    if !grid.is_scalar() {
        return Err(GridProcessorError::WrongGrid { grid });
    }
    Ok(grid.resolution)
}
