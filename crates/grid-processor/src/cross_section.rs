//! Horizontal cross-sections through latitude/longitude fields.
//!
//! A section replaces the latitude and longitude axes of a field with a
//! single `horz_dim` axis running from `(x0, y0)` to `(x1, y1)`. Points along
//! it carry `longitude`, `latitude` and cumulative `distance` (km)
//! coordinates.

use aus400_common::{dims, BoundingBox, Field, SectionEndpoints};
use tracing::{debug, warn};

use crate::distance::deg_to_dist;
use crate::error::{GridProcessorError, Result};
use crate::interpolation::interp_points;
use crate::types::{InterpolationMethod, PointCount};

/// Extract a cross-section from `(x0, y0)` to `(x1, y1)` using linear interpolation.
pub fn cross_sec(
    field: &Field,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    points: PointCount,
) -> Result<Field> {
    let section = SectionEndpoints {
        x0,
        y0,
        x1,
        y1,
        num_points: points.fixed(),
    };
    cross_sec_along(field, &section, InterpolationMethod::default())
}

/// Extract the cross-section described by `section`.
///
/// Sections along a single latitude or longitude with an automatic point
/// count are plain selections; every other section is interpolated.
pub fn cross_sec_along(
    field: &Field,
    section: &SectionEndpoints,
    method: InterpolationMethod,
) -> Result<Field> {
    let SectionEndpoints { x0, y0, x1, y1, .. } = *section;
    if x0 == x1 && y0 == y1 {
        return Err(GridProcessorError::InvalidEndpoints { x: x0, y: y0 });
    }
    if section.num_points == Some(0) {
        return Err(GridProcessorError::InvalidPointCount(0));
    }

    let result = match section.num_points {
        None if x0 == x1 => along_axis(field, dims::LONGITUDE, x0, dims::LATITUDE, y0, y1)?,
        None if y0 == y1 => along_axis(field, dims::LATITUDE, y0, dims::LONGITUDE, x0, x1)?,
        _ => interpolated(field, section, method)?,
    };

    debug!(
        field = field.name(),
        from = ?(x0, y0),
        to = ?(x1, y1),
        points = result.len_of(dims::HORIZONTAL).unwrap_or(0),
        "Extracted cross-section"
    );
    Ok(result.with_section(*section))
}

/// Section along one axis: select the span, take the nearest fixed coordinate.
fn along_axis(
    field: &Field,
    fixed_dim: &str,
    fixed_value: f64,
    span_dim: &str,
    start: f64,
    end: f64,
) -> Result<Field> {
    let selected = field
        .sel_range(span_dim, start, end)?
        .sel_nearest(fixed_dim, fixed_value)?;
    let fixed = selected.require_coord(fixed_dim)?[0];
    let span = selected.require_coord(span_dim)?.to_vec();

    let distance = if span_dim == dims::LATITUDE {
        deg_to_dist(&[fixed], &span)?
    } else {
        deg_to_dist(&span, &[fixed])?
    };

    Ok(selected
        .rename_dim(span_dim, dims::HORIZONTAL)?
        .with_coord(dims::DISTANCE, dims::HORIZONTAL, distance)?)
}

fn interpolated(
    field: &Field,
    section: &SectionEndpoints,
    method: InterpolationMethod,
) -> Result<Field> {
    let SectionEndpoints { x0, y0, x1, y1, .. } = *section;
    let empty = || GridProcessorError::EmptyCrossSection { x0, y0, x1, y1 };

    if let Some(bbox) = field.bbox() {
        let requested = BoundingBox::spanning(x0, y0, x1, y1);
        if bbox.intersection(&requested) != Some(requested) {
            warn!(
                field = field.name(),
                from = ?(x0, y0),
                to = ?(x1, y1),
                ?bbox,
                "Cross-section end points lie outside the data, clipping to the data boundary"
            );
        }
    }

    // A constant axis is left unclipped and sampled at the requested value
    let mut clipped = field.clone();
    if x0 != x1 {
        clipped = clipped.sel_range(dims::LONGITUDE, x0, x1)?;
    }
    if y0 != y1 {
        clipped = clipped.sel_range(dims::LATITUDE, y0, y1)?;
    }

    let lon_native = directed(clipped.require_coord(dims::LONGITUDE)?, x0 <= x1);
    let lat_native = directed(clipped.require_coord(dims::LATITUDE)?, y0 <= y1);
    if lon_native.is_empty() || lat_native.is_empty() {
        return Err(empty());
    }

    let (xa, xb) = if x0 == x1 {
        (x0, x1)
    } else {
        (lon_native[0], lon_native[lon_native.len() - 1])
    };
    let (ya, yb) = if y0 == y1 {
        (y0, y1)
    } else {
        (lat_native[0], lat_native[lat_native.len() - 1])
    };

    let (lons, lats) = match section.num_points {
        Some(n) => (linspace(xa, xb, n), linspace(ya, yb, n)),
        None => {
            let n = lon_native.len().max(lat_native.len());
            if lon_native.len() > lat_native.len() {
                (lon_native, linspace(ya, yb, n))
            } else {
                (linspace(xa, xb, n), lat_native)
            }
        }
    };

    let distance = deg_to_dist(&lons, &lats)?;
    Ok(
        interp_points(&clipped, &lons, &lats, dims::HORIZONTAL, method)?
            .with_coord(dims::DISTANCE, dims::HORIZONTAL, distance)?,
    )
}

/// Coordinate values sorted along the direction of travel.
fn directed(values: &[f64], ascending: bool) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if !ascending {
        sorted.reverse();
    }
    sorted
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            values[n - 1] = end;
            values
        }
    }
}
