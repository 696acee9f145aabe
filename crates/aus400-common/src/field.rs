//! Labelled n-dimensional fields.
//!
//! A [`Field`] is an `f64` array whose axes carry names, with 1-D coordinates
//! attached to those axes. Operations never mutate in place: every selection
//! returns a new field.

use chrono::{DateTime, Utc};
use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{FieldError, FieldResult};
use crate::time::from_epoch_seconds;
use crate::BoundingBox;

/// Dimension and coordinate names used throughout the archive.
pub mod dims {
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const TIME: &str = "time";
    pub const ENSEMBLE: &str = "ensemble";
    pub const MODEL_LEVEL: &str = "model_level_number";
    /// Position along a cross-section.
    pub const HORIZONTAL: &str = "horz_dim";
    /// Cumulative distance along a cross-section in kilometres.
    pub const DISTANCE: &str = "distance";
}

/// A named coordinate, either running along one dimension or scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    name: String,
    dim: Option<String>,
    values: Vec<f64>,
}

impl Coordinate {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dimension this coordinate runs along, `None` for scalars.
    pub fn dim(&self) -> Option<&str> {
        self.dim.as_deref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_scalar(&self) -> bool {
        self.dim.is_none()
    }
}

/// Endpoints of the cross-section a field was extracted along.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionEndpoints {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Explicit point count, `None` when derived from the data resolution.
    pub num_points: Option<usize>,
}

/// A dimension removed by [`Field::squeeze`], kept so it can be restored.
#[derive(Debug, Clone, PartialEq)]
pub struct SqueezedDim {
    pub dim: String,
    pub axis: usize,
    pub coords: Vec<String>,
}

/// An n-dimensional array with named axes and coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    dims: Vec<String>,
    data: ArrayD<f64>,
    coords: Vec<Coordinate>,
    attrs: BTreeMap<String, String>,
    section: Option<SectionEndpoints>,
}

impl Field {
    /// Create a field from its data and one name per axis.
    pub fn new<I, S>(name: impl Into<String>, dims: I, data: ArrayD<f64>) -> FieldResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(FieldError::DimensionCount {
                ndim: data.ndim(),
                names: dims.len(),
            });
        }
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].contains(dim) {
                return Err(FieldError::DuplicateDimension(dim.clone()));
            }
        }

        Ok(Self {
            name: name.into(),
            dims,
            data,
            coords: Vec::new(),
            attrs: BTreeMap::new(),
            section: None,
        })
    }

    /// Attach a coordinate along `dim`, replacing any coordinate of the same name.
    pub fn with_coord(
        mut self,
        name: impl Into<String>,
        dim: &str,
        values: Vec<f64>,
    ) -> FieldResult<Self> {
        let name = name.into();
        let expected = self.require_len(dim)?;
        if values.len() != expected {
            return Err(FieldError::CoordinateLength {
                name,
                dim: dim.to_string(),
                expected,
                actual: values.len(),
            });
        }
        self.set_coord(Coordinate {
            name,
            dim: Some(dim.to_string()),
            values,
        });
        Ok(self)
    }

    /// Attach a scalar coordinate.
    pub fn with_scalar_coord(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set_coord(Coordinate {
            name: name.into(),
            dim: None,
            values: vec![value],
        });
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_section(mut self, section: SectionEndpoints) -> Self {
        self.section = Some(section);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the data, keeping dimensions and coordinates.
    pub fn with_data(mut self, data: ArrayD<f64>) -> FieldResult<Self> {
        if data.shape() != self.data.shape() {
            return Err(FieldError::Incompatible(format!(
                "replacement data has shape {:?}, field has {:?}",
                data.shape(),
                self.data.shape()
            )));
        }
        self.data = data;
        Ok(self)
    }

    fn set_coord(&mut self, coord: Coordinate) {
        match self.coords.iter_mut().find(|c| c.name == coord.name) {
            Some(existing) => *existing = coord,
            None => self.coords.push(coord),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn section(&self) -> Option<&SectionEndpoints> {
        self.section.as_ref()
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|c| c.name == name)
    }

    /// Values of a coordinate, whether dimensional or scalar.
    pub fn coord_values(&self, name: &str) -> Option<&[f64]> {
        self.coord(name).map(Coordinate::values)
    }

    /// Values of the coordinate sharing its name with dimension `dim`.
    pub fn dim_coord(&self, dim: &str) -> Option<&[f64]> {
        self.coord(dim)
            .filter(|c| c.dim() == Some(dim))
            .map(Coordinate::values)
    }

    pub fn axis(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis(dim).is_some()
    }

    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis(dim).map(|a| self.data.len_of(Axis(a)))
    }

    pub fn require_axis(&self, dim: &str) -> FieldResult<usize> {
        self.axis(dim)
            .ok_or_else(|| FieldError::MissingDimension(dim.to_string()))
    }

    fn require_len(&self, dim: &str) -> FieldResult<usize> {
        let axis = self.require_axis(dim)?;
        Ok(self.data.len_of(Axis(axis)))
    }

    /// Values of a coordinate, or an error naming it.
    pub fn require_coord(&self, name: &str) -> FieldResult<&[f64]> {
        self.coord_values(name)
            .ok_or_else(|| FieldError::MissingCoordinate(name.to_string()))
    }

    /// Bounding box of the latitude/longitude coordinates.
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_coords(
            self.coord_values(dims::LONGITUDE)?,
            self.coord_values(dims::LATITUDE)?,
        )
    }

    /// Timestamps of the `time` coordinate.
    pub fn times(&self) -> Option<Vec<DateTime<Utc>>> {
        self.coord_values(dims::TIME)?
            .iter()
            .map(|&s| from_epoch_seconds(s))
            .collect()
    }

    /// Select positions `indices` along `dim`, in the order given.
    pub fn isel(&self, dim: &str, indices: &[usize]) -> FieldResult<Field> {
        let axis = self.require_axis(dim)?;
        let len = self.data.len_of(Axis(axis));
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(FieldError::IndexOutOfRange {
                dim: dim.to_string(),
                index,
                len,
            });
        }

        let data = self.data.select(Axis(axis), indices);
        let coords = self
            .coords
            .iter()
            .map(|c| {
                if c.dim() == Some(dim) {
                    Coordinate {
                        values: indices.iter().map(|&i| c.values[i]).collect(),
                        ..c.clone()
                    }
                } else {
                    c.clone()
                }
            })
            .collect();

        Ok(Field {
            data,
            coords,
            ..self.clone_meta()
        })
    }

    /// Select a single position along `dim`, dropping the dimension.
    ///
    /// Coordinates along `dim` become scalar coordinates.
    pub fn isel_scalar(&self, dim: &str, index: usize) -> FieldResult<Field> {
        let axis = self.require_axis(dim)?;
        let len = self.data.len_of(Axis(axis));
        if index >= len {
            return Err(FieldError::IndexOutOfRange {
                dim: dim.to_string(),
                index,
                len,
            });
        }

        let data = self.data.index_axis(Axis(axis), index).to_owned();
        let mut dims = self.dims.clone();
        dims.remove(axis);
        let coords = self
            .coords
            .iter()
            .map(|c| {
                if c.dim() == Some(dim) {
                    Coordinate {
                        name: c.name.clone(),
                        dim: None,
                        values: vec![c.values[index]],
                    }
                } else {
                    c.clone()
                }
            })
            .collect();

        Ok(Field {
            dims,
            data,
            coords,
            ..self.clone_meta()
        })
    }

    /// Keep positions whose `dim` coordinate lies in `[lo, hi]`, preserving order.
    pub fn sel_range(&self, dim: &str, lo: f64, hi: f64) -> FieldResult<Field> {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let values = self.require_dim_coord(dim)?;
        let indices: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v >= lo && v <= hi)
            .map(|(i, _)| i)
            .collect();
        self.isel(dim, &indices)
    }

    /// Select the position along `dim` nearest to `value`, dropping the dimension.
    pub fn sel_nearest(&self, dim: &str, value: f64) -> FieldResult<Field> {
        let values = self.require_dim_coord(dim)?;
        let index = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .min_by(|(_, a), (_, b)| (*a - value).abs().total_cmp(&(*b - value).abs()))
            .map(|(i, _)| i)
            .ok_or_else(|| FieldError::MissingCoordinate(dim.to_string()))?;
        self.isel_scalar(dim, index)
    }

    fn require_dim_coord(&self, dim: &str) -> FieldResult<&[f64]> {
        self.require_axis(dim)?;
        self.dim_coord(dim)
            .ok_or_else(|| FieldError::MissingCoordinate(dim.to_string()))
    }

    /// Rename dimension `old` to `new`.
    ///
    /// Coordinates keep their names, so the former dimension coordinate
    /// becomes an auxiliary coordinate along `new`.
    pub fn rename_dim(&self, old: &str, new: &str) -> FieldResult<Field> {
        let axis = self.require_axis(old)?;
        if old != new && self.has_dim(new) {
            return Err(FieldError::DuplicateDimension(new.to_string()));
        }

        let mut renamed = self.clone();
        renamed.dims[axis] = new.to_string();
        for coord in renamed.coords.iter_mut() {
            if coord.dim() == Some(old) {
                coord.dim = Some(new.to_string());
            }
        }
        Ok(renamed)
    }

    /// Insert a new axis of length one named `dim` at position `axis`.
    ///
    /// A scalar coordinate named `dim` becomes its dimension coordinate.
    pub fn expand_dims(&self, dim: &str, axis: usize) -> FieldResult<Field> {
        self.expand_dims_with(dim, axis, &[dim])
    }

    fn expand_dims_with(&self, dim: &str, axis: usize, coords: &[&str]) -> FieldResult<Field> {
        if self.has_dim(dim) {
            return Err(FieldError::DuplicateDimension(dim.to_string()));
        }
        if axis > self.ndim() {
            return Err(FieldError::IndexOutOfRange {
                dim: dim.to_string(),
                index: axis,
                len: self.ndim() + 1,
            });
        }

        let mut expanded = self.clone();
        expanded.data = self.data.clone().insert_axis(Axis(axis));
        expanded.dims.insert(axis, dim.to_string());
        for coord in expanded.coords.iter_mut() {
            if coord.is_scalar() && coords.contains(&coord.name.as_str()) {
                coord.dim = Some(dim.to_string());
            }
        }
        Ok(expanded)
    }

    /// Drop every dimension of length one.
    ///
    /// Returns the squeezed field and what is needed to restore the dropped
    /// dimensions with [`Field::unsqueeze`].
    pub fn squeeze(&self) -> FieldResult<(Field, Vec<SqueezedDim>)> {
        let mut squeezed = Vec::new();
        for (axis, dim) in self.dims.iter().enumerate() {
            if self.data.len_of(Axis(axis)) == 1 {
                squeezed.push(SqueezedDim {
                    dim: dim.clone(),
                    axis,
                    coords: self
                        .coords
                        .iter()
                        .filter(|c| c.dim() == Some(dim.as_str()))
                        .map(|c| c.name.clone())
                        .collect(),
                });
            }
        }

        let mut field = self.clone();
        for dropped in squeezed.iter().rev() {
            field = field.isel_scalar(&dropped.dim, 0)?;
        }
        Ok((field, squeezed))
    }

    /// Restore dimensions removed by [`Field::squeeze`] at their original positions.
    pub fn unsqueeze(&self, squeezed: &[SqueezedDim]) -> FieldResult<Field> {
        let mut field = self.clone();
        for dropped in squeezed {
            let coords: Vec<&str> = dropped.coords.iter().map(String::as_str).collect();
            field = field.expand_dims_with(&dropped.dim, dropped.axis, &coords)?;
        }
        Ok(field)
    }

    /// Concatenate fields along an existing dimension.
    ///
    /// Coordinates along `dim` are joined; every other coordinate is taken
    /// from the first part.
    pub fn concat(dim: &str, parts: &[Field]) -> FieldResult<Field> {
        let first = parts
            .first()
            .ok_or_else(|| FieldError::Incompatible("nothing to concatenate".to_string()))?;
        let axis = first.require_axis(dim)?;

        for part in &parts[1..] {
            if part.dims != first.dims {
                return Err(FieldError::Incompatible(format!(
                    "dimensions {:?} do not match {:?}",
                    part.dims, first.dims
                )));
            }
        }

        let views: Vec<_> = parts.iter().map(|p| p.data.view()).collect();
        let data = ndarray::concatenate(Axis(axis), &views)?;

        let mut coords = Vec::with_capacity(first.coords.len());
        for coord in &first.coords {
            if coord.dim() == Some(dim) {
                let mut values = Vec::new();
                for part in parts {
                    let other = part
                        .coord(&coord.name)
                        .filter(|c| c.dim() == Some(dim))
                        .ok_or_else(|| FieldError::MissingCoordinate(coord.name.clone()))?;
                    values.extend_from_slice(&other.values);
                }
                coords.push(Coordinate {
                    values,
                    ..coord.clone()
                });
            } else {
                coords.push(coord.clone());
            }
        }

        Ok(Field {
            data,
            coords,
            ..first.clone_meta()
        })
    }

    /// Broadcast the data to the dimensions and shape of `target`.
    ///
    /// Every dimension of `self` must appear in `target` with the same
    /// length or length one.
    pub fn broadcast_like(&self, target: &Field) -> FieldResult<ArrayD<f64>> {
        let mut order = Vec::with_capacity(self.ndim());
        for dim in &target.dims {
            if let Some(axis) = self.axis(dim) {
                order.push(axis);
            }
        }
        if order.len() != self.ndim() {
            let extra: Vec<&String> = self.dims.iter().filter(|d| !target.has_dim(d)).collect();
            return Err(FieldError::Incompatible(format!(
                "dimensions {:?} are not present in '{}'",
                extra, target.name
            )));
        }

        let mut view = self.data.view().permuted_axes(IxDyn(&order));
        for (axis, dim) in target.dims.iter().enumerate() {
            if !self.has_dim(dim) {
                view = view.insert_axis(Axis(axis));
            }
        }

        let broadcast = view.broadcast(IxDyn(target.shape())).ok_or_else(|| {
            FieldError::Incompatible(format!(
                "cannot broadcast '{}' {:?} to '{}' {:?}",
                self.name,
                self.shape(),
                target.name,
                target.shape()
            ))
        })?;
        Ok(broadcast.to_owned())
    }

    fn clone_meta(&self) -> Field {
        Field {
            name: self.name.clone(),
            dims: self.dims.clone(),
            data: ArrayD::zeros(IxDyn(&[])),
            coords: Vec::new(),
            attrs: self.attrs.clone(),
            section: self.section,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn sample() -> Field {
        let data = Array::from_shape_fn(IxDyn(&[2, 3, 4]), |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2]) as f64
        });
        Field::new("air_temp", ["time", "latitude", "longitude"], data)
            .unwrap()
            .with_coord("time", "time", vec![0.0, 3600.0])
            .unwrap()
            .with_coord("latitude", "latitude", vec![-21.0, -20.0, -19.0])
            .unwrap()
            .with_coord("longitude", "longitude", vec![130.0, 131.0, 132.0, 133.0])
            .unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_dims() {
        let data = ArrayD::zeros(IxDyn(&[2, 2]));
        assert!(matches!(
            Field::new("x", ["a"], data.clone()),
            Err(FieldError::DimensionCount { .. })
        ));
        assert!(matches!(
            Field::new("x", ["a", "a"], data),
            Err(FieldError::DuplicateDimension(_))
        ));
    }

    #[test]
    fn test_coord_length_checked() {
        let field = Field::new("x", ["a"], ArrayD::zeros(IxDyn(&[3]))).unwrap();
        assert!(matches!(
            field.with_coord("a", "a", vec![1.0]),
            Err(FieldError::CoordinateLength { .. })
        ));
    }

    #[test]
    fn test_sel_range_inclusive() {
        let field = sample().sel_range("longitude", 132.0, 131.0).unwrap();
        assert_eq!(field.dim_coord("longitude").unwrap(), &[131.0, 132.0]);
        assert_eq!(field.shape(), &[2, 3, 2]);
        assert_eq!(field.data()[[1, 2, 0]], 121.0);
    }

    #[test]
    fn test_sel_nearest_makes_scalar_coord() {
        let field = sample().sel_nearest("latitude", -19.8).unwrap();
        assert_eq!(field.dims(), &["time", "longitude"]);
        assert!(field.coord("latitude").unwrap().is_scalar());
        assert_eq!(field.coord_values("latitude").unwrap(), &[-20.0]);
        assert_eq!(field.data()[[1, 3]], 113.0);
    }

    #[test]
    fn test_rename_dim_keeps_coordinate_names() {
        let field = sample().rename_dim("latitude", dims::HORIZONTAL).unwrap();
        assert_eq!(field.dims()[1], dims::HORIZONTAL);
        let lat = field.coord("latitude").unwrap();
        assert_eq!(lat.dim(), Some(dims::HORIZONTAL));
        assert!(field.dim_coord("latitude").is_none());
    }

    #[test]
    fn test_squeeze_and_restore() {
        let field = sample().isel("time", &[1]).unwrap();
        let (squeezed, dropped) = field.squeeze().unwrap();
        assert_eq!(squeezed.dims(), &["latitude", "longitude"]);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].axis, 0);

        let restored = squeezed.unsqueeze(&dropped).unwrap();
        assert_eq!(restored, field);
    }

    #[test]
    fn test_concat_along_time() {
        let field = sample();
        let a = field.isel("time", &[0]).unwrap();
        let b = field.isel("time", &[1]).unwrap();
        let joined = Field::concat("time", &[a, b]).unwrap();
        assert_eq!(joined, field);
    }

    #[test]
    fn test_broadcast_like_inserts_missing_axes() {
        let target = sample();
        let profile = Field::new(
            "height",
            ["longitude", "latitude"],
            Array::from_shape_fn(IxDyn(&[4, 3]), |ix| ix[0] as f64),
        )
        .unwrap();

        let broadcast = profile.broadcast_like(&target).unwrap();
        assert_eq!(broadcast.shape(), target.shape());
        assert_eq!(broadcast[[1, 2, 3]], 3.0);
    }

    #[test]
    fn test_bbox() {
        let bbox = sample().bbox().unwrap();
        assert_eq!(bbox, BoundingBox::new(130.0, -21.0, 133.0, -19.0));
    }
}
