//! Alignment of a source-level field with the field being re-levelled.

use aus400_common::{dims, Field};
use ndarray::{ArrayD, Axis};
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::interpolation::fractional_index;

/// Absolute tolerance when matching coordinate values.
pub const ABS_TOLERANCE: f64 = 1e-6;

/// Relative tolerance when matching coordinate values.
pub const REL_TOLERANCE: f64 = 1e-9;

/// Whether two coordinate values refer to the same point.
pub fn values_match(a: f64, b: f64) -> bool {
    let diff = (a - b).abs();
    diff <= ABS_TOLERANCE || diff <= REL_TOLERANCE * a.abs().max(b.abs())
}

/// Index of the value in monotonic `coords` matching `value`.
fn find_match(coords: &[f64], value: f64) -> Option<usize> {
    let candidates = match fractional_index(coords, value) {
        Some(pos) => [pos.floor() as usize, pos.ceil() as usize],
        None => [0, coords.len().saturating_sub(1)],
    };
    candidates
        .into_iter()
        .filter(|&i| i < coords.len())
        .find(|&i| values_match(coords[i], value))
}

/// Pairs of matching indices `(in a, in b)`, in the order of `a`.
pub fn intersect_coords(a: &[f64], b: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut ia = Vec::new();
    let mut ib = Vec::new();
    for (i, &value) in a.iter().enumerate() {
        if let Some(j) = find_match(b, value) {
            ia.push(i);
            ib.push(j);
        }
    }
    (ia, ib)
}

/// Bracketing source positions `(lo, hi, weight of hi)` for each value of
/// `a` inside the range of `b`, with the indices of the values kept.
pub fn bracket_coords(a: &[f64], b: &[f64]) -> (Vec<usize>, Vec<(usize, usize, f64)>) {
    let mut kept = Vec::new();
    let mut brackets = Vec::new();
    for (i, &value) in a.iter().enumerate() {
        let bracket = match find_match(b, value) {
            Some(j) => Some((j, j, 0.0)),
            None => fractional_index(b, value).map(|pos| {
                let lo = pos.floor() as usize;
                let hi = (pos.ceil() as usize).min(b.len() - 1);
                (lo, hi, pos - lo as f64)
            }),
        };
        if let Some(bracket) = bracket {
            kept.push(i);
            brackets.push(bracket);
        }
    }
    (kept, brackets)
}

/// Linearly interpolate `source` along `time` onto `times`.
fn interp_time(source: &Field, times: Vec<f64>, brackets: &[(usize, usize, f64)]) -> Result<Field> {
    let axis = Axis(source.require_axis(dims::TIME)?);
    let lo: Vec<usize> = brackets.iter().map(|b| b.0).collect();
    let hi: Vec<usize> = brackets.iter().map(|b| b.1).collect();
    let lower = source.isel(dims::TIME, &lo)?;
    let upper = source.isel(dims::TIME, &hi)?;

    let mut data = lower.data().clone();
    for (k, &(_, _, w)) in brackets.iter().enumerate() {
        if w > 0.0 {
            let above = upper.data().index_axis(axis, k);
            data.index_axis_mut(axis, k)
                .zip_mut_with(&above, |a, &b| *a = *a * (1.0 - w) + b * w);
        }
    }
    Ok(lower.with_data(data)?.with_coord(dims::TIME, dims::TIME, times)?)
}

/// Align `source` with `field`.
///
/// Shared dimensions are reduced to the coordinate values both fields
/// have. On `time` the source is instead interpolated between the
/// bracketing steps, so sub-hourly fields line up with hourly sources. A source dimension the field lacks is selected at the field's
/// scalar coordinate of the same name, or dropped when of length one.
/// Returns the reduced field and the source data broadcast to its shape.
pub fn align_to(field: &Field, source: &Field) -> Result<(Field, ArrayD<f64>)> {
    let mut field = field.clone();
    let mut source = source.clone();

    for dim in source.dims().to_vec() {
        if field.has_dim(&dim) {
            match (field.dim_coord(&dim), source.dim_coord(&dim)) {
                (Some(fc), Some(sc)) if dim == dims::TIME => {
                    let (fi, brackets) = bracket_coords(fc, sc);
                    if fi.is_empty() {
                        return Err(GridProcessorError::alignment(format!(
                            "'{}' has no '{dim}' values within the range of '{}'",
                            field.name(),
                            source.name()
                        )));
                    }
                    if brackets.iter().any(|&(lo, hi, _)| lo != hi) {
                        debug!(steps = fi.len(), "Interpolating source between time steps");
                    }
                    let times = fi.iter().map(|&i| fc[i]).collect();
                    field = field.isel(&dim, &fi)?;
                    source = interp_time(&source, times, &brackets)?;
                }
                (Some(fc), Some(sc)) => {
                    let (fi, si) = intersect_coords(fc, sc);
                    if fi.is_empty() {
                        return Err(GridProcessorError::alignment(format!(
                            "'{}' and '{}' share no '{dim}' values",
                            field.name(),
                            source.name()
                        )));
                    }
                    if fi.len() != fc.len() {
                        debug!(dim = %dim, kept = fi.len(), of = fc.len(), "Reduced field to shared coordinates");
                    }
                    field = field.isel(&dim, &fi)?;
                    source = source.isel(&dim, &si)?;
                }
                _ => {
                    let (fl, sl) = (field.len_of(&dim), source.len_of(&dim));
                    if fl != sl {
                        return Err(GridProcessorError::alignment(format!(
                            "dimension '{dim}' has length {fl:?} in '{}' but {sl:?} in '{}'",
                            field.name(),
                            source.name()
                        )));
                    }
                }
            }
            continue;
        }

        let scalar = field
            .coord(&dim)
            .filter(|c| c.is_scalar())
            .map(|c| c.values()[0]);
        match (scalar, source.dim_coord(&dim)) {
            (Some(value), Some(sc)) => {
                let index = find_match(sc, value).ok_or_else(|| {
                    GridProcessorError::alignment(format!(
                        "'{}' has no '{dim}' value matching {value}",
                        source.name()
                    ))
                })?;
                source = source.isel_scalar(&dim, index)?;
            }
            _ if source.len_of(&dim) == Some(1) => {
                source = source.isel_scalar(&dim, 0)?;
            }
            _ => {
                return Err(GridProcessorError::alignment(format!(
                    "'{}' has dimension '{dim}' which '{}' lacks",
                    source.name(),
                    field.name()
                )));
            }
        }
    }

    let data = source.broadcast_like(&field)?;
    Ok((field, data))
}
