//! End-to-end archive tests: a miniature archive on disk with CSV
//! catalogue, NetCDF fields and an ESMF weights file.

use std::path::Path;

use aus400_common::time::parse_catalogue_time;
use aus400_common::{dims, DatasetQuery, GridId, LookupError, Resolution, Selection, Stagger};
use grid_processor::{
    identify_grid, DatasetLookup, GridProcessorConfig, GridProcessorError, Regridder,
};
use storage::{ArchiveConfig, ArchiveWeights, Catalogue, CatalogueFilter, StorageError};
use tempfile::TempDir;
use test_utils::{assert_approx_eq, bilinear_weights, grid_lats, grid_lons};

const U_GRID: GridId = GridId::new(Resolution::D0198, Stagger::U);

const CATALOGUE: &str = "\
runid,resolution,ensemble,stream,variable,time,path
u-bq574,d0198,0,slv,sfc_temp,20170328T0000,d0198/slv/sfc_temp_e00_0000.nc
u-bq574,d0198,0,slv,sfc_temp,20170328T0600,d0198/slv/sfc_temp_e00_0600.nc
u-bq574,d0198,1,slv,sfc_temp,20170328T0000,d0198/slv/sfc_temp_e01_0000.nc
u-bq574,d0198,1,slv,sfc_temp,20170328T0600,d0198/slv/sfc_temp_e01_0600.nc
u-bq574,d0198,0,slv,uwnd10m,20170328T0000,d0198/slv/uwnd10m_e00_0000.nc
";

const VARIABLES: &str = "\
variable,stream,standard_name,description,methods
sfc_temp,slv,surface_temperature,Surface temperature,
uwnd10m,slv,eastward_wind,Eastward wind at 10 m,
";

/// Writes a `(time, latitude, longitude)` file with one time step.
fn write_field(path: &Path, variable: &str, hours: f64, grid: GridId, value: impl Fn(f64, f64) -> f64) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let lats = grid_lats(grid, 0, 3);
    let lons = grid_lons(grid, 0, 4);

    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", 1).unwrap();
    file.add_dimension("latitude", lats.len()).unwrap();
    file.add_dimension("longitude", lons.len()).unwrap();

    let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
    time.put_attribute("units", "hours since 2017-03-28 00:00:00").unwrap();
    time.put_values(&[hours], ..).unwrap();

    let mut lat = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
    lat.put_values(&lats, ..).unwrap();
    let mut lon = file.add_variable::<f64>("longitude", &["longitude"]).unwrap();
    lon.put_values(&lons, ..).unwrap();

    let data: Vec<f64> = lats
        .iter()
        .flat_map(|&la| lons.iter().map(move |&lo| (la, lo)))
        .map(|(la, lo)| value(la, lo))
        .collect();
    let mut var = file
        .add_variable::<f64>(variable, &["time", "latitude", "longitude"])
        .unwrap();
    var.put_attribute("units", "K").unwrap();
    var.put_values(&data, ..).unwrap();
}

/// Writes ESMF weights from the 3x4 `u` patch onto the enclosed `t` points.
fn write_weights(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let src_lats = grid_lats(U_GRID, 0, 3);
    let src_lons = grid_lons(U_GRID, 0, 4);
    let dst_lats = grid_lats(GridId::D0198T, 0, 3);
    let dst_lons = grid_lons(GridId::D0198T, 1, 3);
    let triplets = bilinear_weights(&src_lats, &src_lons, &dst_lats, &dst_lons);

    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("n_s", triplets.len()).unwrap();
    file.add_dimension("n_b", dst_lats.len() * dst_lons.len()).unwrap();
    file.add_dimension("grid_rank", 2).unwrap();

    let row: Vec<i32> = triplets.iter().map(|t| t.0 as i32 + 1).collect();
    let col: Vec<i32> = triplets.iter().map(|t| t.1 as i32 + 1).collect();
    let s: Vec<f64> = triplets.iter().map(|t| t.2).collect();
    let xc_b: Vec<f64> = dst_lats.iter().flat_map(|_| dst_lons.iter().copied()).collect();
    let yc_b: Vec<f64> = dst_lats
        .iter()
        .flat_map(|&lat| std::iter::repeat(lat).take(dst_lons.len()))
        .collect();

    let ints = [
        ("row", "n_s", row),
        ("col", "n_s", col),
        ("src_grid_dims", "grid_rank", vec![src_lons.len() as i32, src_lats.len() as i32]),
        ("dst_grid_dims", "grid_rank", vec![dst_lons.len() as i32, dst_lats.len() as i32]),
    ];
    for (name, dim, values) in ints {
        let mut var = file.add_variable::<i32>(name, &[dim]).unwrap();
        var.put_values(&values, ..).unwrap();
    }
    let doubles = [("S", "n_s", s), ("xc_b", "n_b", xc_b), ("yc_b", "n_b", yc_b)];
    for (name, dim, values) in doubles {
        let mut var = file.add_variable::<f64>(name, &[dim]).unwrap();
        var.put_values(&values, ..).unwrap();
    }
}

/// A miniature archive: two ensemble members of surface temperature at two
/// times, one staggered wind file and its destaggering weights.
fn build_archive() -> (TempDir, ArchiveConfig) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("catalogue.csv"), CATALOGUE).unwrap();
    std::fs::write(root.join("variables.csv"), VARIABLES).unwrap();

    for (ensemble, offset) in [(0, 0.0), (1, 100.0)] {
        for hours in [0.0, 6.0] {
            let path = root.join(format!(
                "d0198/slv/sfc_temp_e{:02}_{:02}00.nc",
                ensemble, hours as u32
            ));
            write_field(&path, "sfc_temp", hours, GridId::D0198T, |_, _| 280.0 + hours + offset);
        }
    }
    write_field(
        &root.join("d0198/slv/uwnd10m_e00_0000.nc"),
        "uwnd10m",
        0.0,
        U_GRID,
        |lat, lon| lon - lat,
    );
    write_weights(&root.join("grids/weights_d0198u_to_d0198t.nc"));

    let config = ArchiveConfig {
        root: root.to_path_buf(),
        weights_cache_entries: 2,
    };
    (dir, config)
}

fn sfc_temp() -> CatalogueFilter {
    CatalogueFilter {
        variable: Some("sfc_temp".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_single_member_joined_along_time() {
    let (_dir, config) = build_archive();
    let catalogue = Catalogue::open(&config).unwrap();

    let filter = CatalogueFilter {
        ensemble: Some(Selection::Exact(0)),
        ..sfc_temp()
    };
    let field = catalogue.load(&filter).unwrap();

    assert_eq!(field.dims(), &["time", "latitude", "longitude"]);
    assert_eq!(field.len_of(dims::TIME), Some(2));
    assert_eq!(
        field.dim_coord(dims::TIME).unwrap(),
        &[1_490_659_200.0, 1_490_680_800.0]
    );
    assert_eq!(field.data()[[0, 0, 0]], 280.0);
    assert_eq!(field.data()[[1, 0, 0]], 286.0);

    let ensemble = field.coord(dims::ENSEMBLE).unwrap();
    assert!(ensemble.is_scalar());
    assert_eq!(ensemble.values(), &[0.0]);
    assert_eq!(field.attr("resolution"), Some("d0198"));
    assert_eq!(field.attr("stream"), Some("slv"));
}

#[test]
fn test_members_stacked_along_ensemble() {
    let (_dir, config) = build_archive();
    let catalogue = Catalogue::open(&config).unwrap();

    let field = catalogue.load(&sfc_temp()).unwrap();
    assert_eq!(field.dims()[0], dims::ENSEMBLE);
    assert_eq!(field.shape(), &[2, 2, 3, 4]);
    assert_eq!(field.dim_coord(dims::ENSEMBLE).unwrap(), &[0.0, 1.0]);
    assert_eq!(field.data()[[1, 1, 2, 3]], 386.0);
}

#[test]
fn test_load_all_keys_and_ambiguity() {
    let (_dir, config) = build_archive();
    let catalogue = Catalogue::open(&config).unwrap();

    let everything = CatalogueFilter {
        ensemble: Some(Selection::Exact(0)),
        time: Some(Selection::Exact(parse_catalogue_time("20170328T0000").unwrap())),
        ..Default::default()
    };
    let loaded = catalogue.load_all(&everything).unwrap();
    let keys: Vec<_> = loaded.keys().cloned().collect();
    assert_eq!(keys, vec!["d0198.slv.sfc_temp", "d0198.slv.uwnd10m"]);

    let err = catalogue.load(&everything).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Lookup(LookupError::AmbiguousSelection(_))
    ));
}

#[test]
fn test_dataset_lookup_query() {
    let (_dir, config) = build_archive();
    let catalogue = Catalogue::open(&config).unwrap();
    let lookup: &dyn DatasetLookup = &catalogue;

    let query = DatasetQuery::new(Resolution::D0198, "slv", "sfc_temp")
        .with_ensemble(Selection::Range(1, 1))
        .with_time(Selection::Range(
            parse_catalogue_time("20170328T0500").unwrap(),
            parse_catalogue_time("20170328T0700").unwrap(),
        ));
    let field = lookup.load(&query).unwrap();
    assert_eq!(field.shape(), &[1, 3, 4]);
    assert_eq!(field.data()[[0, 0, 0]], 386.0);

    let missing = DatasetQuery::new(Resolution::D0036, "slv", "sfc_temp");
    assert!(matches!(
        lookup.load(&missing),
        Err(LookupError::EmptySelection(_))
    ));
}

#[test]
fn test_destagger_with_archive_weights() {
    let (_dir, config) = build_archive();
    let catalogue = Catalogue::open(&config).unwrap();
    let weights = ArchiveWeights::new(&config);

    let wind = catalogue
        .load(&CatalogueFilter {
            variable: Some("uwnd10m".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(identify_grid(&wind).unwrap(), U_GRID);

    let regridder = Regridder::new(&weights, &catalogue, GridProcessorConfig::default());
    let scalar = regridder.to_scalar_grid(&wind).unwrap();
    assert_eq!(identify_grid(&scalar).unwrap(), GridId::D0198T);
    assert_eq!(scalar.shape(), &[1, 3, 3]);

    let lats = scalar.coord_values(dims::LATITUDE).unwrap();
    let lons = scalar.coord_values(dims::LONGITUDE).unwrap();
    assert_approx_eq!(scalar.data()[[0, 1, 2]], lons[2] - lats[1], 1e-9);

    // Second use is served from the cache
    regridder.to_scalar_grid(&wind).unwrap();
    let stats = weights.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[test]
fn test_missing_weights_file() {
    let (_dir, config) = build_archive();
    let catalogue = Catalogue::open(&config).unwrap();
    let weights = ArchiveWeights::new(&config);

    let temp = catalogue
        .load(&CatalogueFilter {
            ensemble: Some(Selection::Exact(0)),
            ..sfc_temp()
        })
        .unwrap();
    let regridder = Regridder::new(&weights, &catalogue, GridProcessorConfig::default());

    let err = regridder.to_reference_grid(&temp).unwrap_err();
    assert!(matches!(
        err,
        GridProcessorError::MissingWeights { ref target_grid, .. } if target_grid == "barra_r"
    ));
}

#[test]
fn test_real_archive_catalogue() {
    let root = test_utils::require_archive!();
    let config = ArchiveConfig {
        root,
        ..Default::default()
    };
    let catalogue = Catalogue::open(&config).unwrap();
    assert!(!catalogue.entries().is_empty());

    let fx = catalogue.filter(&CatalogueFilter {
        resolution: Some(Resolution::D0198),
        stream: Some("fx".to_string()),
        ..Default::default()
    });
    assert!(fx.iter().any(|e| e.variable == "lnd_mask"));
}
