//! Precomputed sparse regridding weights.
//!
//! A [`WeightsTable`] maps every cell of a rectilinear target grid to a
//! weighted set of source cells. Tables are stored compressed by target
//! cell: `offsets[k]..offsets[k + 1]` indexes the entries of target `k`.

use aus400_common::{dims, Field, GridId};
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::interpolation::{horizontal_slabs, map_slabs, rebuild_horizontal};

/// One source contribution to a target cell.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WeightEntry {
    source: usize,
    weight: f64,
}

/// Sparse mapping from a source grid onto a target grid.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightsTable {
    source: GridId,
    target: String,
    /// `(nlat, nlon)` of the source grid.
    source_shape: (usize, usize),
    target_lats: Vec<f64>,
    target_lons: Vec<f64>,
    offsets: Vec<usize>,
    entries: Vec<WeightEntry>,
}

impl WeightsTable {
    /// Build a table from `(target, source, weight)` triplets.
    ///
    /// Cell indices are zero based and row major (latitude, then longitude).
    pub fn from_triplets<I>(
        source: GridId,
        target: impl Into<String>,
        source_shape: (usize, usize),
        target_lats: Vec<f64>,
        target_lons: Vec<f64>,
        triplets: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let n_source = source_shape.0 * source_shape.1;
        let n_target = target_lats.len() * target_lons.len();

        let mut per_target: Vec<Vec<WeightEntry>> = vec![Vec::new(); n_target];
        for (t, s, weight) in triplets {
            if t >= n_target || s >= n_source {
                return Err(GridProcessorError::shape_mismatch(format!(
                    "weight maps source cell {s} to target cell {t}, grids have {n_source} and {n_target} cells"
                )));
            }
            per_target[t].push(WeightEntry { source: s, weight });
        }

        let mut offsets = Vec::with_capacity(n_target + 1);
        let mut entries = Vec::new();
        offsets.push(0);
        for cell in per_target {
            entries.extend(cell);
            offsets.push(entries.len());
        }

        Ok(Self {
            source,
            target: target.into(),
            source_shape,
            target_lats,
            target_lons,
            offsets,
            entries,
        })
    }

    pub fn source(&self) -> &GridId {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn source_shape(&self) -> (usize, usize) {
        self.source_shape
    }

    pub fn target_lats(&self) -> &[f64] {
        &self.target_lats
    }

    pub fn target_lons(&self) -> &[f64] {
        &self.target_lons
    }

    /// Number of stored weights.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weighted mean of the finite source values feeding target cell `k`.
    #[inline]
    fn compute_value(&self, k: usize, value_at: impl Fn(usize) -> f64) -> f64 {
        let mut sum = 0.0;
        let mut w_total = 0.0;

        for entry in &self.entries[self.offsets[k]..self.offsets[k + 1]] {
            let val = value_at(entry.source);
            if val.is_finite() {
                sum += val * entry.weight;
                w_total += entry.weight;
            }
        }

        if w_total != 0.0 {
            sum / w_total
        } else {
            f64::NAN
        }
    }

    /// Regrid `field` onto the target grid.
    ///
    /// Latitude and longitude must be dimensions matching the source shape;
    /// every other dimension is carried over unchanged.
    pub fn apply(&self, field: &Field) -> Result<Field> {
        let (nlat, nlon) = self.source_shape;
        let shape = (
            field.len_of(dims::LATITUDE),
            field.len_of(dims::LONGITUDE),
        );
        if shape != (Some(nlat), Some(nlon)) {
            return Err(GridProcessorError::shape_mismatch(format!(
                "'{}' has latitude x longitude {:?} x {:?}, weights from {} expect {} x {}",
                field.name(),
                shape.0,
                shape.1,
                self.source,
                nlat,
                nlon
            )));
        }

        let slabs = horizontal_slabs(field)?;
        let n_target = self.target_lats.len() * self.target_lons.len();
        let flat = map_slabs(&slabs.data, n_target, |grid| {
            (0..n_target)
                .map(|k| self.compute_value(k, |s| grid[[s / nlon, s % nlon]]))
                .collect()
        });

        debug!(
            field = field.name(),
            source = %self.source,
            target_grid = %self.target,
            weights = self.entries.len(),
            "Applied regridding weights"
        );
        rebuild_horizontal(field, &slabs, flat, &self.target_lats, &self.target_lons)
    }
}
