//! Geographic bounding boxes in degrees.

use serde::{Deserialize, Serialize};

/// A longitude/latitude bounding box, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box spanning two points, in any order.
    pub fn spanning(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Box enclosing every finite value of two coordinate arrays.
    ///
    /// Returns `None` if either array has no finite values.
    pub fn from_coords(lons: &[f64], lats: &[f64]) -> Option<Self> {
        let (min_lon, max_lon) = finite_extent(lons)?;
        let (min_lat, max_lat) = finite_extent(lats)?;
        Some(Self::new(min_lon, min_lat, max_lon, max_lat))
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point lies within the box (edges included).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Check if this box shares any point with another, edges included.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_lon: self.min_lon.max(other.min_lon),
            min_lat: self.min_lat.max(other.min_lat),
            max_lon: self.max_lon.min(other.max_lon),
            max_lat: self.max_lat.min(other.max_lat),
        })
    }
}

fn finite_extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanning_orders_corners() {
        let bbox = BoundingBox::spanning(135.0, -20.0, 130.0, -25.0);
        assert_eq!(bbox.min_lon, 130.0);
        assert_eq!(bbox.max_lon, 135.0);
        assert_eq!(bbox.min_lat, -25.0);
        assert_eq!(bbox.max_lat, -20.0);
    }

    #[test]
    fn test_from_coords_skips_nan() {
        let bbox = BoundingBox::from_coords(&[f64::NAN, 130.0, 131.0], &[-21.0, -20.0]).unwrap();
        assert_eq!(bbox.min_lon, 130.0);
        assert_eq!(bbox.max_lon, 131.0);
        assert!(BoundingBox::from_coords(&[], &[1.0]).is_none());
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let intersection = a.intersection(&b).unwrap();
        assert_eq!(intersection.min_lon, 5.0);
        assert_eq!(intersection.min_lat, 5.0);
        assert_eq!(intersection.max_lon, 10.0);
        assert_eq!(intersection.max_lat, 10.0);
    }

    #[test]
    fn test_contains_edges() {
        let bbox = BoundingBox::new(125.0, -30.0, 140.0, -10.0);
        assert!(bbox.contains(125.0, -10.0));
        assert!(!bbox.contains(124.9, -20.0));
    }
}
