//! Native NetCDF access using the netcdf library.
//!
//! Thin helpers shared by the field and weights readers: opening files,
//! reading numeric variables as `f64` whatever their stored type, and
//! looking up optional attributes without HDF5 error spam.

use std::path::Path;
use std::sync::Once;

use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// This function disables that output by calling H5Eset_auto2 with null handlers.
/// It only needs to be called once per process, but is safe to call multiple times.
///
/// **Important**: Call this function early in your program's startup (e.g., in main())
/// before any HDF5/NetCDF operations occur.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Open a NetCDF file for reading.
pub(crate) fn open(path: &Path) -> NetCdfResult<netcdf::File> {
    silence_hdf5_errors();

    if !path.exists() {
        return Err(NetCdfError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    netcdf::open(path)
        .map_err(|e| NetCdfError::netcdf(format!("Failed to open {}", path.display()), e))
}

/// Look up a variable that must exist.
pub(crate) fn require_variable<'f>(
    file: &'f netcdf::File,
    name: &str,
) -> NetCdfResult<netcdf::Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))
}

/// Read every value of a numeric variable as `f64`.
pub(crate) fn read_f64(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    let context = || format!("Failed to read {}", var.name());
    let values = match var.vartype() {
        NcVariableType::Float(FloatType::F64) => var
            .get_values::<f64, _>(..)
            .map_err(|e| NetCdfError::netcdf(context(), e))?,
        NcVariableType::Float(FloatType::F32) => widen(var.get_values::<f32, _>(..), context)?,
        NcVariableType::Int(IntType::I8) => widen(var.get_values::<i8, _>(..), context)?,
        NcVariableType::Int(IntType::U8) => widen(var.get_values::<u8, _>(..), context)?,
        NcVariableType::Int(IntType::I16) => widen(var.get_values::<i16, _>(..), context)?,
        NcVariableType::Int(IntType::U16) => widen(var.get_values::<u16, _>(..), context)?,
        NcVariableType::Int(IntType::I32) => widen(var.get_values::<i32, _>(..), context)?,
        NcVariableType::Int(IntType::U32) => widen(var.get_values::<u32, _>(..), context)?,
        NcVariableType::Int(IntType::I64) => var
            .get_values::<i64, _>(..)
            .map_err(|e| NetCdfError::netcdf(context(), e))?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        NcVariableType::Int(IntType::U64) => var
            .get_values::<u64, _>(..)
            .map_err(|e| NetCdfError::netcdf(context(), e))?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        other => {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has non-numeric type {:?}",
                var.name(),
                other
            )))
        }
    };
    Ok(values)
}

fn widen<T: Into<f64>>(
    values: Result<Vec<T>, netcdf::Error>,
    context: impl Fn() -> String,
) -> NetCdfResult<Vec<f64>> {
    values
        .map(|v| v.into_iter().map(Into::into).collect())
        .map_err(|e| NetCdfError::netcdf(context(), e))
}

/// Read a numeric variable as non-negative integers.
pub(crate) fn read_indices(var: &netcdf::Variable) -> NetCdfResult<Vec<usize>> {
    read_f64(var)?
        .into_iter()
        .map(|v| {
            if v >= 0.0 && v.fract() == 0.0 {
                Ok(v as usize)
            } else {
                Err(NetCdfError::InvalidFormat(format!(
                    "{} holds {} where an index was expected",
                    var.name(),
                    v
                )))
            }
        })
        .collect()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
pub(crate) fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64.
pub(crate) fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get a text attribute.
pub(crate) fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// All text attributes of a variable, in file order.
pub(crate) fn string_attrs(var: &netcdf::Variable) -> Vec<(String, String)> {
    var.attributes()
        .filter_map(|attr| match attr.value() {
            Ok(AttributeValue::Str(s)) => Some((attr.name().to_string(), s)),
            _ => None,
        })
        .collect()
}
