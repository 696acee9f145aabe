//! Grid identification from coordinate values.
//!
//! The archive does not label which grid a variable lives on, so it is
//! recovered from the coordinates: the spacing gives the resolution and the
//! offset of the first point from the domain origin gives the staggering.

use aus400_common::{
    dims, Field, GridId, Resolution, Stagger, DOMAIN_ORIGIN_LAT, DOMAIN_ORIGIN_LON,
};
use tracing::debug;

use crate::error::{GridProcessorError, Result};

/// Largest distance from a half-cell offset still treated as staggered, in degrees.
pub const STAGGER_TOLERANCE: f64 = 1e-4;

fn spacing_resolution(values: Option<&[f64]>) -> Option<Resolution> {
    match values {
        Some([first, second, ..]) => Resolution::from_spacing(second - first),
        _ => None,
    }
}

fn has_spacing(values: Option<&[f64]>) -> bool {
    values.is_some_and(|v| v.len() >= 2)
}

/// Identify the resolution of a field.
///
/// Latitude spacing is tried first, then longitude spacing. The
/// `resolution` attribute is only trusted when the coordinates cannot carry
/// the native spacing: cross-sections, whose points are resampled along the
/// path, and fields with no axis of two or more samples.
pub fn identify_resolution(field: &Field) -> Result<Resolution> {
    let lats = field.coord_values(dims::LATITUDE);
    let lons = field.coord_values(dims::LONGITUDE);
    let from_attr = || field.attr("resolution").and_then(|r| r.parse::<Resolution>().ok());

    let resolution = if field.section().is_some() {
        from_attr().or_else(|| spacing_resolution(lats).or_else(|| spacing_resolution(lons)))
    } else if has_spacing(lats) || has_spacing(lons) {
        spacing_resolution(lats).or_else(|| spacing_resolution(lons))
    } else {
        from_attr()
    };

    resolution.ok_or_else(|| {
        GridProcessorError::unknown_grid(format!(
            "coordinate spacing of '{}' matches none of {:?}",
            field.name(),
            Resolution::KNOWN.map(|r| r.to_string())
        ))
    })
}

fn is_half_cell(value: f64, origin: f64, spacing: f64) -> bool {
    let offset = (value - origin).rem_euclid(spacing);
    (offset - spacing / 2.0).abs() < STAGGER_TOLERANCE
}

/// Identify the staggering of a field given its resolution.
pub fn identify_subgrid(field: &Field, resolution: Resolution) -> Result<Stagger> {
    let first = |name: &str| {
        field
            .coord_values(name)
            .and_then(|v| v.first().copied())
            .ok_or_else(|| GridProcessorError::unknown_grid(format!("field has no {name} coordinate")))
    };
    let lat = first(dims::LATITUDE)?;
    let lon = first(dims::LONGITUDE)?;
    let spacing = resolution.degrees();

    let stagger = if is_half_cell(lon, DOMAIN_ORIGIN_LON, spacing) {
        Stagger::U
    } else if is_half_cell(lat, DOMAIN_ORIGIN_LAT, spacing) {
        Stagger::V
    } else {
        Stagger::T
    };
    Ok(stagger)
}

/// Identify the grid of a field from its coordinates.
pub fn identify_grid(field: &Field) -> Result<GridId> {
    let resolution = identify_resolution(field)?;
    let stagger = identify_subgrid(field, resolution)?;
    let grid = GridId::new(resolution, stagger);
    debug!(field = field.name(), %grid, "Identified grid");
    Ok(grid)
}
