//! Vertical interpolation against in-memory pressure and height fields.

mod common;

use aus400_common::time::parse_catalogue_time;
use aus400_common::{dims, GridId, Resolution, Selection, Stagger};
use common::InMemoryLookup;
use ndarray::Axis;
use grid_processor::{cross_sec, GridProcessorConfig, GridProcessorError, PointCount, VerticalInterpolator};
use test_utils::time::{FILE_TIME, FILE_TIME_EPOCH};
use test_utils::{
    assert_approx_eq, create_grid_field, create_height_field, create_level_field,
    create_pressure_field, with_times,
};

const LEVELS: usize = 45;
const SHAPE: (usize, usize) = (4, 4);

/// Temperature falling 6.5 K per model level.
fn air_temp() -> aus400_common::Field {
    let field = create_level_field("air_temp", GridId::D0198T, LEVELS, SHAPE, |level, _, _| {
        300.0 - 6.5 * (level - 1.0)
    });
    with_times(&field, &[FILE_TIME_EPOCH]).with_scalar_coord(dims::ENSEMBLE, 0.0)
}

fn pressure_lookup() -> InMemoryLookup {
    let pressure = create_pressure_field(GridId::D0198T, LEVELS, SHAPE);
    let pressure = with_times(
        &pressure,
        &[FILE_TIME_EPOCH - 3600.0, FILE_TIME_EPOCH, FILE_TIME_EPOCH + 3600.0],
    );
    InMemoryLookup::new().with(Resolution::D0198, "mdl", "pressure", pressure)
}

#[test]
fn test_single_pressure_level() {
    let lookup = pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());

    let out = interpolator.to_pressure_levels(&air_temp(), &[10_000.0]).unwrap();
    assert!(!out.has_dim(dims::MODEL_LEVEL));
    assert_eq!(out.len_of("pressure"), Some(1));
    assert_eq!(out.dim_coord("pressure").unwrap(), &[10_000.0]);
    assert_eq!(out.dims()[1], "pressure");
    assert_eq!(out.len_of(dims::TIME), Some(1));
    assert!(out.data().iter().all(|v| v.is_finite()));
}

#[test]
fn test_pressure_query_covers_hourly_window() {
    let lookup = pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());
    interpolator.to_pressure_levels(&air_temp(), &[50_000.0]).unwrap();

    let queries = lookup.queries.borrow();
    assert_eq!(queries.len(), 1);
    let query = &queries[0];
    assert_eq!(query.variable, "pressure");
    assert_eq!(query.ensemble, Some(Selection::Range(0, 0)));

    let file_time = parse_catalogue_time(FILE_TIME).unwrap();
    assert_eq!(
        query.time,
        Some(Selection::Range(
            file_time - chrono::Duration::hours(1),
            file_time + chrono::Duration::hours(1),
        ))
    );
}

#[test]
fn test_pressure_levels_follow_column() {
    let lookup = pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());
    let field = air_temp();

    // Level 1 and level 2 pressures at the first column
    let pressure = create_pressure_field(GridId::D0198T, LEVELS, SHAPE);
    let p1 = pressure.data()[[0, 0, 0]];
    let p2 = pressure.data()[[1, 0, 0]];
    let midway = 0.5 * (p1 + p2);

    let out = interpolator.to_pressure_levels(&field, &[midway]).unwrap();
    assert_approx_eq!(out.data()[[0, 0, 0, 0]], 300.0 - 0.5 * 6.5, 1e-9);
}

/// Hourly pressure rising 1% per step from one hour before the file time.
fn drifting_pressure_lookup() -> InMemoryLookup {
    let pressure = with_times(
        &create_pressure_field(GridId::D0198T, LEVELS, SHAPE),
        &[FILE_TIME_EPOCH - 3600.0, FILE_TIME_EPOCH, FILE_TIME_EPOCH + 3600.0],
    );
    let mut data = pressure.data().clone();
    for (step, mut slab) in data.axis_iter_mut(Axis(0)).enumerate() {
        slab *= 1.0 + 0.01 * step as f64;
    }
    let pressure = pressure.with_data(data).unwrap();
    InMemoryLookup::new().with(Resolution::D0198, "mdl", "pressure", pressure)
}

#[test]
fn test_sub_hourly_field_uses_interpolated_pressure() {
    let lookup = drifting_pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());
    let field = air_temp().isel_scalar(dims::TIME, 0).unwrap();
    let field = with_times(&field, &[FILE_TIME_EPOCH + 600.0, FILE_TIME_EPOCH + 1200.0]);

    // Level 1 pressure at the first column, ten minutes past the file time
    let base = create_pressure_field(GridId::D0198T, LEVELS, SHAPE).data()[[0, 0, 0]];
    let p1 = base * (1.01 + 0.01 / 6.0);

    let out = interpolator.to_pressure_levels(&field, &[p1]).unwrap();
    assert_eq!(
        out.dim_coord(dims::TIME).unwrap(),
        &[FILE_TIME_EPOCH + 600.0, FILE_TIME_EPOCH + 1200.0]
    );
    assert_approx_eq!(out.data()[[0, 0, 0, 0]], 300.0, 1e-6);
    // Twenty minutes past, the same pressure sits above level 1
    assert!(out.data()[[1, 0, 0, 0]] < 300.0);
}

#[test]
fn test_mixed_time_steps_are_all_kept() {
    let lookup = drifting_pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());
    let field = air_temp().isel_scalar(dims::TIME, 0).unwrap();
    let field = with_times(&field, &[FILE_TIME_EPOCH, FILE_TIME_EPOCH + 1800.0]);

    let out = interpolator.to_pressure_levels(&field, &[50_000.0]).unwrap();
    assert_eq!(out.len_of(dims::TIME), Some(2));
    assert!(out.data().iter().all(|v| v.is_finite()));
}

#[test]
fn test_unbracketed_pressure_is_nan() {
    let lookup = pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());

    let out = interpolator.to_pressure_levels(&air_temp(), &[200_000.0]).unwrap();
    assert!(out.data().iter().all(|v| v.is_nan()));
}

#[test]
fn test_height_levels() {
    let height = create_height_field(GridId::D0198T, LEVELS, SHAPE);
    let lookup = InMemoryLookup::new().with(Resolution::D0198, "fx", "height_rho", height);
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());

    // 145 m is halfway between levels 1 and 2
    let out = interpolator.to_height_levels(&air_temp(), &[145.0, 1_020.0]).unwrap();
    assert_eq!(out.dim_coord("height_rho").unwrap(), &[145.0, 1_020.0]);
    assert_approx_eq!(out.data()[[0, 0, 2, 3]], 300.0 - 0.5 * 6.5, 1e-9);
    assert_approx_eq!(out.data()[[0, 1, 2, 3]], 300.0 - 4.0 * 6.5, 1e-9);
}

#[test]
fn test_cross_sectioned_field() {
    let lookup = pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());

    let field = air_temp();
    let bbox = field.bbox().unwrap();
    let section = cross_sec(
        &field,
        bbox.min_lon,
        bbox.min_lat,
        bbox.max_lon,
        bbox.max_lat,
        PointCount::Fixed(6),
    )
    .unwrap();

    let out = interpolator.to_pressure_levels(&section, &[85_000.0, 50_000.0]).unwrap();
    assert_eq!(out.len_of(dims::HORIZONTAL), Some(6));
    assert_eq!(out.len_of("pressure"), Some(2));
    assert!(out.coord_values(dims::DISTANCE).is_some());
    assert!(out.data().iter().all(|v| v.is_finite()));
}

#[test]
fn test_staggered_field_rejected() {
    let u_grid = GridId::new(Resolution::D0198, Stagger::U);
    let u = create_level_field("wnd_ucmp", u_grid, LEVELS, SHAPE, |_, _, _| 1.0);
    let lookup = pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());

    let err = interpolator.to_pressure_levels(&u, &[50_000.0]).unwrap_err();
    assert!(matches!(err, GridProcessorError::WrongGrid { .. }));
    assert!(lookup.queries.borrow().is_empty());
}

#[test]
fn test_field_without_model_levels_rejected() {
    let lookup = pressure_lookup();
    let interpolator = VerticalInterpolator::new(&lookup, GridProcessorConfig::default());
    let surface = create_grid_field("sfc_temp", GridId::D0198T, (0, 0), SHAPE, |_, _| 1.0);

    let err = interpolator.to_pressure_levels(&surface, &[50_000.0]).unwrap_err();
    assert!(matches!(err, GridProcessorError::MissingDimension(_)));
}
