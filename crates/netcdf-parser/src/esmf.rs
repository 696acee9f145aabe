//! ESMF offline regridding weights files.
//!
//! Weights files store a sparse matrix in coordinate form: for every entry,
//! `row` is the 1-based destination cell, `col` the 1-based source cell and
//! `S` the weight. Grid dimensions are stored fastest-varying first, so a
//! rectilinear `(lat, lon)` grid has `grid_dims = [nlon, nlat]`.

use std::path::Path;

use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{open, read_f64, read_indices, require_variable};

/// Raw contents of an ESMF weights file.
#[derive(Debug, Clone, PartialEq)]
pub struct EsmfWeights {
    pub col: Vec<usize>,
    pub row: Vec<usize>,
    pub s: Vec<f64>,
    pub src_grid_dims: Vec<usize>,
    pub dst_grid_dims: Vec<usize>,
    /// Destination cell centre longitudes, one per destination cell.
    pub xc_b: Vec<f64>,
    /// Destination cell centre latitudes, one per destination cell.
    pub yc_b: Vec<f64>,
}

impl EsmfWeights {
    /// Source grid shape as `(nlat, nlon)`.
    pub fn source_shape(&self) -> NetCdfResult<(usize, usize)> {
        rectilinear_shape("src_grid_dims", &self.src_grid_dims)
    }

    /// Destination grid shape as `(nlat, nlon)`.
    pub fn target_shape(&self) -> NetCdfResult<(usize, usize)> {
        rectilinear_shape("dst_grid_dims", &self.dst_grid_dims)
    }

    /// Destination latitude and longitude axes.
    ///
    /// Takes the longitudes of the first destination row and the latitude
    /// of the first cell of every row.
    pub fn target_axes(&self) -> NetCdfResult<(Vec<f64>, Vec<f64>)> {
        let (nlat, nlon) = self.target_shape()?;
        if self.xc_b.len() != nlat * nlon || self.yc_b.len() != nlat * nlon {
            return Err(NetCdfError::InvalidFormat(format!(
                "xc_b/yc_b hold {}/{} centres for a {}x{} destination grid",
                self.xc_b.len(),
                self.yc_b.len(),
                nlat,
                nlon
            )));
        }
        let lons = self.xc_b[..nlon].to_vec();
        let lats = (0..nlat).map(|k| self.yc_b[k * nlon]).collect();
        Ok((lats, lons))
    }

    /// Zero-based `(target, source, weight)` triplets.
    pub fn triplets(&self) -> NetCdfResult<Vec<(usize, usize, f64)>> {
        if self.row.len() != self.s.len() || self.col.len() != self.s.len() {
            return Err(NetCdfError::InvalidFormat(format!(
                "row/col/S lengths differ: {}/{}/{}",
                self.row.len(),
                self.col.len(),
                self.s.len()
            )));
        }
        self.row
            .iter()
            .zip(&self.col)
            .zip(&self.s)
            .map(|((&row, &col), &weight)| match (row.checked_sub(1), col.checked_sub(1)) {
                (Some(target), Some(source)) => Ok((target, source, weight)),
                _ => Err(NetCdfError::InvalidFormat(
                    "row/col indices are 1-based, found 0".to_string(),
                )),
            })
            .collect()
    }
}

fn rectilinear_shape(name: &str, dims: &[usize]) -> NetCdfResult<(usize, usize)> {
    match dims {
        [nlon, nlat] => Ok((*nlat, *nlon)),
        _ => Err(NetCdfError::InvalidFormat(format!(
            "{} should hold two entries, found {:?}",
            name, dims
        ))),
    }
}

/// Read an ESMF weights file.
pub fn read_esmf_weights(path: impl AsRef<Path>) -> NetCdfResult<EsmfWeights> {
    let path = path.as_ref();
    let file = open(path)?;

    let weights = EsmfWeights {
        col: read_indices(&require_variable(&file, "col")?)?,
        row: read_indices(&require_variable(&file, "row")?)?,
        s: read_f64(&require_variable(&file, "S")?)?,
        src_grid_dims: read_indices(&require_variable(&file, "src_grid_dims")?)?,
        dst_grid_dims: read_indices(&require_variable(&file, "dst_grid_dims")?)?,
        xc_b: read_f64(&require_variable(&file, "xc_b")?)?,
        yc_b: read_f64(&require_variable(&file, "yc_b")?)?,
    };

    debug!(
        path = %path.display(),
        entries = weights.s.len(),
        src = ?weights.src_grid_dims,
        dst = ?weights.dst_grid_dims,
        "Read ESMF weights"
    );
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two source cells in a row averaged onto a single destination cell.
    fn write_weights(path: &Path) {
        let mut file = netcdf::create(path).unwrap();
        file.add_dimension("n_s", 2).unwrap();
        file.add_dimension("n_b", 1).unwrap();
        file.add_dimension("src_grid_rank", 2).unwrap();
        file.add_dimension("dst_grid_rank", 2).unwrap();

        let ints: [(&str, &str, Vec<i32>); 4] = [
            ("col", "n_s", vec![1, 2]),
            ("row", "n_s", vec![1, 1]),
            ("src_grid_dims", "src_grid_rank", vec![2, 1]),
            ("dst_grid_dims", "dst_grid_rank", vec![1, 1]),
        ];
        for (name, dim, values) in ints {
            let mut var = file.add_variable::<i32>(name, &[dim]).unwrap();
            var.put_values(&values, ..).unwrap();
        }

        let doubles: [(&str, &str, Vec<f64>); 3] = [
            ("S", "n_s", vec![0.5, 0.5]),
            ("xc_b", "n_b", vec![133.27]),
            ("yc_b", "n_b", vec![-27.8]),
        ];
        for (name, dim, values) in doubles {
            let mut var = file.add_variable::<f64>(name, &[dim]).unwrap();
            var.put_values(&values, ..).unwrap();
        }
    }

    #[test]
    fn test_read_esmf_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights_d0036u_to_d0036t.nc");
        write_weights(&path);

        let weights = read_esmf_weights(&path).unwrap();
        assert_eq!(weights.col, vec![1, 2]);
        assert_eq!(weights.source_shape().unwrap(), (1, 2));
        assert_eq!(weights.target_shape().unwrap(), (1, 1));
        assert_eq!(
            weights.target_axes().unwrap(),
            (vec![-27.8], vec![133.27])
        );
        assert_eq!(
            weights.triplets().unwrap(),
            vec![(0, 0, 0.5), (0, 1, 0.5)]
        );
    }

    #[test]
    fn test_target_axes_of_rectilinear_grid() {
        let weights = EsmfWeights {
            col: vec![],
            row: vec![],
            s: vec![],
            src_grid_dims: vec![1, 1],
            dst_grid_dims: vec![3, 2],
            xc_b: vec![10.0, 11.0, 12.0, 10.0, 11.0, 12.0],
            yc_b: vec![-5.0, -5.0, -5.0, -4.0, -4.0, -4.0],
        };
        let (lats, lons) = weights.target_axes().unwrap();
        assert_eq!(lats, vec![-5.0, -4.0]);
        assert_eq!(lons, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_zero_index_rejected() {
        let weights = EsmfWeights {
            col: vec![0],
            row: vec![1],
            s: vec![1.0],
            src_grid_dims: vec![1, 1],
            dst_grid_dims: vec![1, 1],
            xc_b: vec![0.0],
            yc_b: vec![0.0],
        };
        assert!(weights.triplets().is_err());
    }

    #[test]
    fn test_missing_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.nc");
        netcdf::create(&path).unwrap();

        let err = read_esmf_weights(&path).unwrap_err();
        assert!(matches!(err, NetCdfError::MissingData(_)));
    }
}
