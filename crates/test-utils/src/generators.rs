//! Test data generators for synthetic Aus400 fields.
//!
//! Coordinates are laid out exactly as on the archive grids: whole cells
//! from the domain origin, shifted by half a cell for staggered grids. Cell
//! index 0 is the origin itself.

use aus400_common::{
    dims, Field, GridId, Stagger, DOMAIN_ORIGIN_LAT, DOMAIN_ORIGIN_LON,
};
use ndarray::{Array, IxDyn};

/// Latitudes of `n` points on `grid` starting `start` cells from the origin.
///
/// # Example
///
/// ```
/// use aus400_common::GridId;
/// use test_utils::grid_lats;
///
/// let lats = grid_lats(GridId::D0198T, 0, 3);
/// assert_eq!(lats[0], -27.8);
/// ```
pub fn grid_lats(grid: GridId, start: i64, n: usize) -> Vec<f64> {
    let shift = if grid.stagger == Stagger::V { 0.5 } else { 0.0 };
    axis_values(DOMAIN_ORIGIN_LAT, grid.resolution.degrees(), start, shift, n)
}

/// Longitudes of `n` points on `grid` starting `start` cells from the origin.
pub fn grid_lons(grid: GridId, start: i64, n: usize) -> Vec<f64> {
    let shift = if grid.stagger == Stagger::U { 0.5 } else { 0.0 };
    axis_values(DOMAIN_ORIGIN_LON, grid.resolution.degrees(), start, shift, n)
}

fn axis_values(origin: f64, spacing: f64, start: i64, shift: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| origin + (start as f64 + i as f64 + shift) * spacing)
        .collect()
}

/// Creates a 2-D `(latitude, longitude)` field on an Aus400 grid.
///
/// Values are produced by `f(lat, lon)`.
pub fn create_grid_field<F>(
    name: &str,
    grid: GridId,
    origin: (i64, i64),
    shape: (usize, usize),
    f: F,
) -> Field
where
    F: Fn(f64, f64) -> f64,
{
    let lats = grid_lats(grid, origin.0, shape.0);
    let lons = grid_lons(grid, origin.1, shape.1);
    let data = Array::from_shape_fn(IxDyn(&[shape.0, shape.1]), |ix| f(lats[ix[0]], lons[ix[1]]));

    Field::new(name, [dims::LATITUDE, dims::LONGITUDE], data)
        .and_then(|field| field.with_coord(dims::LATITUDE, dims::LATITUDE, lats))
        .and_then(|field| field.with_coord(dims::LONGITUDE, dims::LONGITUDE, lons))
        .expect("generated grid field is consistent")
        .with_attr("resolution", grid.resolution.to_string())
}

/// Creates a `(model_level_number, latitude, longitude)` field.
///
/// Model levels are numbered from 1. Values are produced by
/// `f(level, lat, lon)`.
pub fn create_level_field<F>(
    name: &str,
    grid: GridId,
    levels: usize,
    shape: (usize, usize),
    f: F,
) -> Field
where
    F: Fn(f64, f64, f64) -> f64,
{
    let level_values: Vec<f64> = (1..=levels).map(|l| l as f64).collect();
    let lats = grid_lats(grid, 0, shape.0);
    let lons = grid_lons(grid, 0, shape.1);
    let data = Array::from_shape_fn(IxDyn(&[levels, shape.0, shape.1]), |ix| {
        f(level_values[ix[0]], lats[ix[1]], lons[ix[2]])
    });

    Field::new(
        name,
        [dims::MODEL_LEVEL, dims::LATITUDE, dims::LONGITUDE],
        data,
    )
    .and_then(|field| field.with_coord(dims::MODEL_LEVEL, dims::MODEL_LEVEL, level_values))
    .and_then(|field| field.with_coord(dims::LATITUDE, dims::LATITUDE, lats))
    .and_then(|field| field.with_coord(dims::LONGITUDE, dims::LONGITUDE, lons))
    .expect("generated level field is consistent")
    .with_attr("resolution", grid.resolution.to_string())
}

/// Model-level pressure in Pa, falling exponentially with level.
///
/// Level 1 sits at about 1000 hPa and level 40 near 100 hPa, with a
/// slight horizontal gradient so columns differ.
pub fn create_pressure_field(grid: GridId, levels: usize, shape: (usize, usize)) -> Field {
    create_level_field("pressure", grid, levels, shape, |level, lat, lon| {
        let surface = 100_000.0 + (lat - DOMAIN_ORIGIN_LAT) * 10.0 + (lon - DOMAIN_ORIGIN_LON) * 5.0;
        surface * (-(level - 1.0) * 0.059).exp()
    })
}

/// Model-level height above sea level in m, 250 m per level.
pub fn create_height_field(grid: GridId, levels: usize, shape: (usize, usize)) -> Field {
    create_level_field("height_rho", grid, levels, shape, |level, _, _| {
        20.0 + (level - 1.0) * 250.0
    })
}

/// Adds a leading `time` dimension, one copy of the field per timestamp.
///
/// Times are seconds since the Unix epoch.
pub fn with_times(field: &Field, times: &[f64]) -> Field {
    let parts: Vec<Field> = times
        .iter()
        .map(|&t| {
            field
                .clone()
                .with_scalar_coord(dims::TIME, t)
                .expand_dims(dims::TIME, 0)
                .expect("time is a new dimension")
        })
        .collect();
    Field::concat(dims::TIME, &parts).expect("time slices share dimensions")
}

/// Bilinear `(target, source, weight)` triplets from one rectilinear grid
/// to another.
///
/// Cell indices are row major (latitude, then longitude). Target points
/// outside the source grid get no weights.
pub fn bilinear_weights(
    source_lats: &[f64],
    source_lons: &[f64],
    target_lats: &[f64],
    target_lons: &[f64],
) -> Vec<(usize, usize, f64)> {
    let nlon = source_lons.len();
    let mut triplets = Vec::new();

    for (ti, &lat) in target_lats.iter().enumerate() {
        let Some((r0, r1, rf)) = bracket(source_lats, lat) else {
            continue;
        };
        for (tj, &lon) in target_lons.iter().enumerate() {
            let Some((c0, c1, cf)) = bracket(source_lons, lon) else {
                continue;
            };
            let target = ti * target_lons.len() + tj;
            let corners = [
                (r0, c0, (1.0 - rf) * (1.0 - cf)),
                (r0, c1, (1.0 - rf) * cf),
                (r1, c0, rf * (1.0 - cf)),
                (r1, c1, rf * cf),
            ];
            for (r, c, w) in corners {
                if w > 0.0 {
                    triplets.push((target, r * nlon + c, w));
                }
            }
        }
    }
    triplets
}

/// Neighbouring indices and fraction of `value` in ascending `coords`.
fn bracket(coords: &[f64], value: f64) -> Option<(usize, usize, f64)> {
    let n = coords.len();
    if n == 0 || value < coords[0] - 1e-9 || value > coords[n - 1] + 1e-9 {
        return None;
    }
    if n == 1 {
        return Some((0, 0, 0.0));
    }
    let upper = coords.partition_point(|&c| c <= value).clamp(1, n - 1);
    let lower = upper - 1;
    let frac = ((value - coords[lower]) / (coords[upper] - coords[lower])).clamp(0.0, 1.0);
    Some((lower, upper, frac))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aus400_common::Resolution;

    #[test]
    fn test_staggered_coordinates() {
        let u = GridId::new(Resolution::D0036, Stagger::U);
        let lons = grid_lons(u, 0, 2);
        assert!((lons[0] - (DOMAIN_ORIGIN_LON + 0.0018)).abs() < 1e-12);
        assert!((lons[1] - lons[0] - 0.0036).abs() < 1e-12);
        assert_eq!(grid_lats(u, 0, 1), vec![DOMAIN_ORIGIN_LAT]);
    }

    #[test]
    fn test_create_grid_field() {
        let field = create_grid_field("t", GridId::D0198T, (-2, 3), (4, 5), |lat, _| lat);
        assert_eq!(field.shape(), &[4, 5]);
        assert!((field.data()[[0, 0]] - (DOMAIN_ORIGIN_LAT - 2.0 * 0.0198)).abs() < 1e-12);
        assert_eq!(field.attr("resolution"), Some("d0198"));
    }

    #[test]
    fn test_pressure_decreases_upwards() {
        let p = create_pressure_field(GridId::D0198T, 5, (2, 2));
        let column: Vec<f64> = (0..5).map(|l| p.data()[[l, 1, 1]]).collect();
        assert!(column.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_with_times() {
        let field = create_grid_field("t", GridId::D0198T, (0, 0), (2, 2), |_, _| 1.0);
        let timed = with_times(&field, &[0.0, 3600.0]);
        assert_eq!(timed.dims()[0], dims::TIME);
        assert_eq!(timed.dim_coord(dims::TIME).unwrap(), &[0.0, 3600.0]);
    }

    #[test]
    fn test_bilinear_weights_sum_to_one() {
        let src = [0.0, 1.0, 2.0];
        let triplets = bilinear_weights(&src, &src, &[0.5, 5.0], &[1.25]);
        let total: f64 = triplets.iter().filter(|t| t.0 == 0).map(|t| t.2).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(triplets.iter().all(|t| t.0 == 0));
    }
}
