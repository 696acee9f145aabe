//! Interpolation of fields on rectilinear latitude/longitude grids.
//!
//! Horizontal sampling works on 2-D slabs: every axis other than latitude
//! and longitude is flattened into an outer index, each slab is sampled
//! independently and the result is reshaped back.

use aus400_common::{dims, Field, FieldError};
use ndarray::{Array3, ArrayD, ArrayView2, Axis, IxDyn};
use rayon::prelude::*;

use crate::error::{GridProcessorError, Result};
use crate::types::InterpolationMethod;

/// Slack allowed when a sample sits exactly on the edge of a coordinate range.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Slab count above which horizontal sampling runs in parallel.
const PARALLEL_THRESHOLD: usize = 8;

/// Position of `value` within monotonic `coords` as a fractional index.
///
/// Works for ascending and descending coordinates. Returns `None` when the
/// value lies outside the coordinate range.
pub fn fractional_index(coords: &[f64], value: f64) -> Option<f64> {
    let n = coords.len();
    if n == 0 || !value.is_finite() {
        return None;
    }
    if n == 1 {
        return ((coords[0] - value).abs() <= EDGE_TOLERANCE).then_some(0.0);
    }

    let (first, last) = (coords[0], coords[n - 1]);
    let ascending = first <= last;
    let (lo, hi) = if ascending { (first, last) } else { (last, first) };
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let eps = EDGE_TOLERANCE * (hi - lo).abs().max(1.0);
    if value < lo - eps || value > hi + eps {
        return None;
    }
    let value = value.clamp(lo, hi);

    let upper = if ascending {
        coords.partition_point(|&c| c <= value)
    } else {
        coords.partition_point(|&c| c >= value)
    };
    let i = upper.saturating_sub(1).min(n - 2);
    let span = coords[i + 1] - coords[i];
    if span == 0.0 {
        return Some(i as f64);
    }
    Some(i as f64 + ((value - coords[i]) / span).clamp(0.0, 1.0))
}

/// Nearest neighbor interpolation.
///
/// Returns the value of the nearest grid point.
pub fn nearest_interpolate(grid: ArrayView2<f64>, row: f64, col: f64) -> f64 {
    let (height, width) = grid.dim();
    if row < 0.0 || col < 0.0 {
        return f64::NAN;
    }
    let r = row.round() as usize;
    let c = col.round() as usize;

    if r >= height || c >= width {
        return f64::NAN;
    }

    grid[[r, c]]
}

/// Bilinear interpolation.
///
/// Smoothly interpolates between the four nearest grid points.
pub fn bilinear_interpolate(grid: ArrayView2<f64>, row: f64, col: f64) -> f64 {
    let (height, width) = grid.dim();
    if row < 0.0 || col < 0.0 {
        return f64::NAN;
    }
    let r0 = row.floor() as usize;
    let c0 = col.floor() as usize;

    if r0 >= height || c0 >= width {
        return f64::NAN;
    }

    let r1 = (r0 + 1).min(height - 1);
    let c1 = (c0 + 1).min(width - 1);
    let rf = row - r0 as f64;
    let cf = col - c0 as f64;

    let v00 = grid[[r0, c0]];
    let v01 = grid[[r0, c1]];
    let v10 = grid[[r1, c0]];
    let v11 = grid[[r1, c1]];

    // If any corner is NaN, return NaN
    if v00.is_nan() || v01.is_nan() || v10.is_nan() || v11.is_nan() {
        return f64::NAN;
    }

    let top = v00 * (1.0 - cf) + v01 * cf;
    let bottom = v10 * (1.0 - cf) + v11 * cf;
    top * (1.0 - rf) + bottom * rf
}

fn sample(grid: ArrayView2<f64>, at: Option<(f64, f64)>, method: InterpolationMethod) -> f64 {
    match at {
        None => f64::NAN,
        Some((row, col)) => match method {
            InterpolationMethod::Nearest => nearest_interpolate(grid, row, col),
            InterpolationMethod::Linear => bilinear_interpolate(grid, row, col),
        },
    }
}

/// A field rearranged as `(outer, latitude, longitude)` slabs.
pub(crate) struct Slabs {
    pub(crate) data: Array3<f64>,
    /// Axes of the source field folded into the outer index, in order.
    outer_axes: Vec<usize>,
    lat_axis: usize,
    lon_axis: usize,
}

pub(crate) fn horizontal_slabs(field: &Field) -> Result<Slabs> {
    let lat_axis = field
        .axis(dims::LATITUDE)
        .ok_or_else(|| GridProcessorError::missing_dimension(dims::LATITUDE))?;
    let lon_axis = field
        .axis(dims::LONGITUDE)
        .ok_or_else(|| GridProcessorError::missing_dimension(dims::LONGITUDE))?;

    let outer_axes: Vec<usize> = (0..field.ndim())
        .filter(|&a| a != lat_axis && a != lon_axis)
        .collect();
    let mut order = outer_axes.clone();
    order.extend([lat_axis, lon_axis]);

    let shape = field.shape();
    let outer: usize = outer_axes.iter().map(|&a| shape[a]).product();
    let view = field.data().view().permuted_axes(IxDyn(&order));
    let flat: Vec<f64> = view.iter().copied().collect();
    let data = Array3::from_shape_vec((outer, shape[lat_axis], shape[lon_axis]), flat)
        .map_err(FieldError::from)?;

    Ok(Slabs {
        data,
        outer_axes,
        lat_axis,
        lon_axis,
    })
}

/// Sample every slab with `f`, producing `per_slab` values each.
pub(crate) fn map_slabs<F>(slabs: &Array3<f64>, per_slab: usize, f: F) -> Vec<f64>
where
    F: Fn(ArrayView2<f64>) -> Vec<f64> + Sync,
{
    let outer = slabs.len_of(Axis(0));
    let rows: Vec<Vec<f64>> = if outer >= PARALLEL_THRESHOLD {
        (0..outer)
            .into_par_iter()
            .map(|o| f(slabs.index_axis(Axis(0), o)))
            .collect()
    } else {
        slabs.outer_iter().map(|slab| f(slab)).collect()
    };

    let mut flat = Vec::with_capacity(outer * per_slab);
    for row in rows {
        flat.extend(row);
    }
    flat
}

/// Copy coordinates, attributes and section of `src` not tied to `dropped` dims.
pub(crate) fn carry_metadata(src: &Field, mut dst: Field, dropped: &[&str]) -> Result<Field> {
    for coord in src.coords() {
        match coord.dim() {
            Some(dim) if dropped.contains(&dim) => {}
            Some(dim) => {
                dst = dst.with_coord(coord.name(), dim, coord.values().to_vec())?;
            }
            None => dst = dst.with_scalar_coord(coord.name(), coord.values()[0]),
        }
    }
    for (key, value) in src.attrs() {
        dst = dst.with_attr(key, value);
    }
    if let Some(section) = src.section() {
        dst = dst.with_section(*section);
    }
    Ok(dst)
}

/// Interpolate a field at a sequence of (longitude, latitude) points.
///
/// Latitude and longitude are replaced by a single axis `new_dim` placed at
/// the position of the first of them, carrying `longitude` and `latitude`
/// coordinates of the points. Points outside the data produce NaN.
pub fn interp_points(
    field: &Field,
    lons: &[f64],
    lats: &[f64],
    new_dim: &str,
    method: InterpolationMethod,
) -> Result<Field> {
    if lons.len() != lats.len() {
        return Err(GridProcessorError::shape_mismatch(format!(
            "{} longitudes for {} latitudes",
            lons.len(),
            lats.len()
        )));
    }
    let lat_coord = field.require_coord(dims::LATITUDE)?;
    let lon_coord = field.require_coord(dims::LONGITUDE)?;
    let slabs = horizontal_slabs(field)?;

    let positions: Vec<Option<(f64, f64)>> = lats
        .iter()
        .zip(lons)
        .map(|(&lat, &lon)| {
            Some((
                fractional_index(lat_coord, lat)?,
                fractional_index(lon_coord, lon)?,
            ))
        })
        .collect();

    let n = positions.len();
    let flat = map_slabs(&slabs.data, n, |grid| {
        positions
            .iter()
            .map(|&at| sample(grid, at, method))
            .collect()
    });

    let insert_at = slabs.lat_axis.min(slabs.lon_axis);
    let mut out_dims: Vec<String> = slabs
        .outer_axes
        .iter()
        .map(|&a| field.dims()[a].clone())
        .collect();
    let mut shape: Vec<usize> = slabs.outer_axes.iter().map(|&a| field.shape()[a]).collect();
    shape.push(n);
    out_dims.push(new_dim.to_string());

    // Move the new axis from the end to where latitude/longitude were
    let n_outer = slabs.outer_axes.len();
    let mut perm: Vec<usize> = (0..insert_at).collect();
    perm.push(n_outer);
    perm.extend(insert_at..n_outer);

    let data = ArrayD::from_shape_vec(IxDyn(&shape), flat)
        .map_err(FieldError::from)?
        .permuted_axes(IxDyn(&perm))
        .as_standard_layout()
        .into_owned();
    let out_dims: Vec<String> = perm.iter().map(|&p| out_dims[p].clone()).collect();

    let out = Field::new(field.name(), out_dims, data)?;
    let out = carry_metadata(field, out, &[dims::LATITUDE, dims::LONGITUDE])?;
    Ok(out
        .with_coord(dims::LONGITUDE, new_dim, lons.to_vec())?
        .with_coord(dims::LATITUDE, new_dim, lats.to_vec())?)
}

/// Bilinearly interpolate a field onto new rectilinear latitude/longitude axes.
///
/// Latitude and longitude keep their positions among the field's axes.
pub fn interp_rectilinear(field: &Field, lats: &[f64], lons: &[f64]) -> Result<Field> {
    let lat_coord = field.require_coord(dims::LATITUDE)?;
    let lon_coord = field.require_coord(dims::LONGITUDE)?;
    let slabs = horizontal_slabs(field)?;

    let rows: Vec<Option<f64>> = lats.iter().map(|&v| fractional_index(lat_coord, v)).collect();
    let cols: Vec<Option<f64>> = lons.iter().map(|&v| fractional_index(lon_coord, v)).collect();

    let per_slab = lats.len() * lons.len();
    let flat = map_slabs(&slabs.data, per_slab, |grid| {
        let mut out = Vec::with_capacity(per_slab);
        for row in &rows {
            for col in &cols {
                let at = row.zip(*col);
                out.push(sample(grid, at, InterpolationMethod::Linear));
            }
        }
        out
    });

    rebuild_horizontal(field, &slabs, flat, lats, lons)
}

/// Reassemble sampled slabs into a field on new latitude/longitude axes.
///
/// `flat` holds `lats.len() * lons.len()` values per slab, latitude major.
/// Latitude and longitude return to their original axis positions.
pub(crate) fn rebuild_horizontal(
    field: &Field,
    slabs: &Slabs,
    flat: Vec<f64>,
    lats: &[f64],
    lons: &[f64],
) -> Result<Field> {
    let mut shape: Vec<usize> = slabs.outer_axes.iter().map(|&a| field.shape()[a]).collect();
    shape.extend([lats.len(), lons.len()]);

    let n_outer = slabs.outer_axes.len();
    let mut next_outer = 0;
    let perm: Vec<usize> = (0..field.ndim())
        .map(|axis| {
            if axis == slabs.lat_axis {
                n_outer
            } else if axis == slabs.lon_axis {
                n_outer + 1
            } else {
                next_outer += 1;
                next_outer - 1
            }
        })
        .collect();

    let data = ArrayD::from_shape_vec(IxDyn(&shape), flat)
        .map_err(FieldError::from)?
        .permuted_axes(IxDyn(&perm))
        .as_standard_layout()
        .into_owned();

    let out = Field::new(field.name(), field.dims().to_vec(), data)?;
    let out = carry_metadata(field, out, &[dims::LATITUDE, dims::LONGITUDE])?;
    Ok(out
        .with_coord(dims::LATITUDE, dims::LATITUDE, lats.to_vec())?
        .with_coord(dims::LONGITUDE, dims::LONGITUDE, lons.to_vec())?)
}

/// Linearly interpolate one column onto target levels.
///
/// `source` holds the monotonic level variable (e.g. pressure) of the
/// column and `values` the field values at the same points. Targets not
/// bracketed by the column give NaN.
pub fn interp_column(source: &[f64], values: &[f64], targets: &[f64]) -> Vec<f64> {
    targets
        .iter()
        .map(|&target| {
            let Some(pos) = fractional_index(source, target) else {
                return f64::NAN;
            };
            let i = pos.floor() as usize;
            let frac = pos - i as f64;
            let lower = values[i];
            if frac == 0.0 {
                return if source[i].is_finite() { lower } else { f64::NAN };
            }
            let upper = values[(i + 1).min(values.len() - 1)];
            if !source[i].is_finite() || !source[i + 1].is_finite() {
                return f64::NAN;
            }
            lower + (upper - lower) * frac
        })
        .collect()
}
