//! JSON descriptions of fields.

use std::collections::BTreeMap;

use aus400_common::{Field, SectionEndpoints};
use chrono::{DateTime, Utc};
use grid_processor::identify_grid;
use serde::Serialize;

/// One dimension with the range of its coordinate, when it has one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimSummary {
    pub name: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<f64>,
}

/// Statistics over the finite values of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub finite: usize,
    pub missing: usize,
}

impl ValueStats {
    /// `None` if no value is finite.
    pub fn of(field: &Field) -> Option<Self> {
        let mut stats = Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            finite: 0,
            missing: 0,
        };
        let mut sum = 0.0;
        for &v in field.data().iter() {
            if v.is_finite() {
                stats.min = stats.min.min(v);
                stats.max = stats.max.max(v);
                sum += v;
                stats.finite += 1;
            } else {
                stats.missing += 1;
            }
        }
        if stats.finite == 0 {
            return None;
        }
        stats.mean = sum / stats.finite as f64;
        Some(stats)
    }
}

/// Printable description of a [`Field`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
    pub dims: Vec<DimSummary>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scalar_coords: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub times: Vec<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionEndpoints>,
    pub attrs: BTreeMap<String, String>,
    pub stats: Option<ValueStats>,
}

impl FieldSummary {
    pub fn of(field: &Field) -> Self {
        let dims = field
            .dims()
            .iter()
            .zip(field.shape())
            .map(|(dim, &size)| {
                let coord = field.dim_coord(dim);
                DimSummary {
                    name: dim.clone(),
                    size,
                    first: coord.and_then(|c| c.first().copied()),
                    last: coord.and_then(|c| c.last().copied()),
                }
            })
            .collect();

        let scalar_coords = field
            .coords()
            .iter()
            .filter(|c| c.is_scalar())
            .filter_map(|c| c.values().first().map(|&v| (c.name().to_string(), v)))
            .collect();

        Self {
            name: field.name().to_string(),
            grid: identify_grid(field).ok().map(|g| g.to_string()),
            dims,
            scalar_coords,
            times: field.times().unwrap_or_default(),
            section: field.section().copied(),
            attrs: field.attrs().clone(),
            stats: ValueStats::of(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aus400_common::{dims, GridId};
    use ndarray::{ArrayD, IxDyn};
    use test_utils::create_grid_field;

    #[test]
    fn test_summary_of_grid_field() {
        let field = create_grid_field("sfc_temp", GridId::D0198T, (0, 0), (3, 4), |lat, lon| lon - lat);
        let summary = FieldSummary::of(&field);

        assert_eq!(summary.grid.as_deref(), Some("d0198t"));
        assert_eq!(summary.dims.len(), 2);
        assert_eq!(summary.dims[0].name, dims::LATITUDE);
        assert_eq!(summary.dims[0].size, 3);
        assert_eq!(summary.dims[1].first, Some(133.26));
        assert!(summary.times.is_empty());

        let stats = summary.stats.unwrap();
        assert_eq!(stats.finite, 12);
        assert_eq!(stats.missing, 0);
        assert!(stats.min < stats.max);
    }

    #[test]
    fn test_stats_skip_missing() {
        let data = ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, f64::NAN, 3.0]).unwrap();
        let field = Field::new("x", ["n"], data).unwrap();
        let stats = ValueStats::of(&field).unwrap();
        assert_eq!((stats.min, stats.max, stats.mean), (1.0, 3.0, 2.0));
        assert_eq!(stats.missing, 1);

        let empty = Field::new("x", ["n"], ArrayD::from_elem(IxDyn(&[2]), f64::NAN)).unwrap();
        assert!(ValueStats::of(&empty).is_none());
    }
}
