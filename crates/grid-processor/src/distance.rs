//! Cumulative distance along a path of (longitude, latitude) points.
//!
//! Distances use a local planar approximation on a sphere: each step is
//! split into a zonal component scaled by the cosine of latitude and a
//! meridional component. This is accurate for the short steps of a
//! cross-section but is not a great-circle distance.

use crate::error::{GridProcessorError, Result};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Cumulative distance in kilometres along a path.
///
/// A single longitude value describes a meridional path and a single
/// latitude value a zonal one; the step between the first two points is
/// then taken as the uniform step of the whole path. Otherwise `lons` and
/// `lats` must have equal length, and the zonal part of each step is scaled
/// by the cosine of the latitude midway along that step, so a path and its
/// reverse have the same length.
pub fn deg_to_dist(lons: &[f64], lats: &[f64]) -> Result<Vec<f64>> {
    if lons.is_empty() || lats.is_empty() {
        return Ok(Vec::new());
    }

    if lons.len() == 1 && lats.len() > 1 {
        let step = EARTH_RADIUS_M * (lats[1] - lats[0]).to_radians().abs();
        return Ok(uniform(step, lats.len()));
    }

    if lats.len() == 1 && lons.len() > 1 {
        let step = EARTH_RADIUS_M
            * lats[0].to_radians().cos()
            * (lons[1] - lons[0]).to_radians().abs();
        return Ok(uniform(step, lons.len()));
    }

    if lons.len() != lats.len() {
        return Err(GridProcessorError::shape_mismatch(format!(
            "path has {} longitudes and {} latitudes",
            lons.len(),
            lats.len()
        )));
    }

    let mut total = 0.0;
    let mut dist = Vec::with_capacity(lons.len());
    dist.push(0.0);
    for i in 1..lons.len() {
        let lat_mid = ((lats[i] + lats[i - 1]) / 2.0).to_radians();
        let dx = EARTH_RADIUS_M * lat_mid.cos() * (lons[i] - lons[i - 1]).to_radians();
        let dy = EARTH_RADIUS_M * (lats[i] - lats[i - 1]).to_radians();
        total += dx.hypot(dy);
        dist.push(total / 1000.0);
    }
    Ok(dist)
}

fn uniform(step_m: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 * step_m / 1000.0).collect()
}
