//! Common test fixtures for Aus400 tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios when working with the archive.

/// Common bounding box definitions as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Around Darwin, inside the 400 m nest
    pub const DARWIN: (f64, f64, f64, f64) = (130.5, -12.8, 131.2, -12.2);

    /// Central Australia around the domain origin
    pub const CENTRAL: (f64, f64, f64, f64) = (132.0, -29.0, 134.5, -26.5);

    /// Entirely outside the Aus400 domain
    pub const OUTSIDE: (f64, f64, f64, f64) = (170.0, 10.0, 171.0, 11.0);
}

/// Common vertical levels for testing.
pub mod levels {
    /// Standard pressure levels in Pa
    pub const PRESSURE_PA: [f64; 5] = [100_000.0, 85_000.0, 70_000.0, 50_000.0, 25_000.0];

    /// Heights above sea level in m
    pub const HEIGHT_M: [f64; 4] = [500.0, 1_000.0, 2_000.0, 5_000.0];
}

/// Common time values for testing.
pub mod time {
    /// First timestamp of a 6-hourly archive file, catalogue format
    pub const FILE_TIME: &str = "20170328T1200";

    /// 2017-03-28T12:00:00Z as seconds since the Unix epoch
    pub const FILE_TIME_EPOCH: f64 = 1_490_702_400.0;

    /// Ten-minute output interval in seconds
    pub const OUTPUT_STEP: f64 = 600.0;
}

/// Sample catalogue contents.
pub mod catalogue {
    /// Run identifier used in the sample rows
    pub const RUNID: &str = "u-bq574";

    /// A small `catalogue.csv`.
    pub const CATALOGUE_CSV: &str = "\
runid,resolution,ensemble,stream,variable,time,path
u-bq574,d0198,0,mdl,air_temp,20170328T0600,d0198/mdl/air_temp/air_temp_e00_20170328T0600.nc
u-bq574,d0198,0,mdl,air_temp,20170328T1200,d0198/mdl/air_temp/air_temp_e00_20170328T1200.nc
u-bq574,d0198,1,mdl,air_temp,20170328T0600,d0198/mdl/air_temp/air_temp_e01_20170328T0600.nc
u-bq574,d0198,0,mdl,pressure,20170328T1200,d0198/mdl/pressure/pressure_e00_20170328T1200.nc
u-bq574,d0198,0,fx,height_rho,20170326T0000,d0198/fx/height_rho.nc
u-bq574,d0036,0,spec,sfc_temp,20170326T0000,d0036/spec/sfc_temp/sfc_temp_e00_20170326T0000.nc
u-bq574,d0036,0,spec,sfc_temp,20170326T0600,d0036/spec/sfc_temp/sfc_temp_e00_20170326T0600.nc
u-bq574,d0036,0,spec,sfc_temp,20170327T0000,d0036/spec/sfc_temp/sfc_temp_e00_20170327T0000.nc
";

    /// A small `variables.csv` matching [`CATALOGUE_CSV`].
    pub const VARIABLES_CSV: &str = "\
variable,stream,standard_name,description,methods
air_temp,mdl,air_temperature,Air temperature on model levels,
pressure,mdl,air_pressure,Pressure on model levels,
height_rho,fx,height_above_reference_ellipsoid,Height of rho levels,
sfc_temp,spec,surface_temperature,Surface temperature,time: point
";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_rows_share_columns() {
        let columns = catalogue::CATALOGUE_CSV.lines().next().unwrap().split(',').count();
        for line in catalogue::CATALOGUE_CSV.lines() {
            assert_eq!(line.split(',').count(), columns, "{line}");
        }
    }

    #[test]
    fn test_pressure_levels_descend() {
        assert!(levels::PRESSURE_PA.windows(2).all(|w| w[1] < w[0]));
    }
}
