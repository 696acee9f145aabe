//! Reading archive variables into [`Field`]s.

use std::path::Path;

use aus400_common::time::CfTimeUnits;
use aus400_common::{dims, Field};
use ndarray::{ArrayD, IxDyn};
use tracing::{debug, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{
    get_f64_attr, get_string_attr, open, read_f64, require_variable, string_attrs,
};

/// Read `variable` from the NetCDF file at `path`.
///
/// Fill and missing values become NaN and packing (`scale_factor`,
/// `add_offset`) is undone. Each dimension with a variable of the same name
/// gets it as its coordinate, and scalar variables listed in the
/// `coordinates` attribute become scalar coordinates. Times are converted
/// from CF units to seconds since the Unix epoch. Text attributes of the
/// variable are carried over.
pub fn read_field(path: impl AsRef<Path>, variable: &str) -> NetCdfResult<Field> {
    let path = path.as_ref();
    let file = open(path)?;
    let var = require_variable(&file, variable)?;

    let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values = unpack(&var, read_f64(&var)?);
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(aus400_common::FieldError::from)?;

    let mut field = Field::new(variable, dim_names.iter().cloned(), data)?;
    for dim in &dim_names {
        let Some(coord_var) = file.variable(dim) else {
            continue;
        };
        if coord_var.dimensions().len() != 1 || coord_var.dimensions()[0].name() != *dim {
            continue;
        }
        let values = coordinate_values(&coord_var)?;
        field = field.with_coord(dim.as_str(), dim.as_str(), values)?;
    }

    if let Some(listed) = get_string_attr(&var, "coordinates") {
        for name in listed.split_whitespace() {
            if field.coord(name).is_some() {
                continue;
            }
            match file.variable(name) {
                Some(scalar) if scalar.dimensions().is_empty() => {
                    let values = coordinate_values(&scalar)?;
                    if let Some(&value) = values.first() {
                        field = field.with_scalar_coord(name, value);
                    }
                }
                Some(_) => debug!(variable, coordinate = name, "Skipping non-scalar auxiliary coordinate"),
                None => warn!(variable, coordinate = name, "Listed coordinate not found in file"),
            }
        }
    }

    for (key, value) in string_attrs(&var) {
        if key != "coordinates" {
            field = field.with_attr(key, value);
        }
    }

    debug!(
        path = %path.display(),
        variable,
        shape = ?field.shape(),
        "Read field"
    );
    Ok(field)
}

/// Apply fill/missing masking and CF packing to raw values.
fn unpack(var: &netcdf::Variable, mut values: Vec<f64>) -> Vec<f64> {
    let fill = get_f64_attr(var, "_FillValue");
    let missing = get_f64_attr(var, "missing_value");
    let scale = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);

    for v in values.iter_mut() {
        if Some(*v) == fill || Some(*v) == missing {
            *v = f64::NAN;
        } else {
            *v = *v * scale + offset;
        }
    }
    values
}

/// Values of a coordinate variable, with CF times as epoch seconds.
fn coordinate_values(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    let values = unpack(var, read_f64(var)?);
    let units = get_string_attr(var, "units");

    match units.filter(|u| u.contains(" since ")) {
        Some(units) => {
            let cf = CfTimeUnits::parse(&units).map_err(|e| {
                NetCdfError::InvalidFormat(format!("{} units '{}': {}", var.name(), units, e))
            })?;
            Ok(values.into_iter().map(|v| cf.to_epoch_seconds(v)).collect())
        }
        None if var.name() == dims::TIME => Err(NetCdfError::MissingData(format!(
            "CF units on the {} coordinate",
            dims::TIME
        ))),
        None => Ok(values),
    }
}
