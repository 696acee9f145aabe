//! Grid identities for the Aus400 archive.
//!
//! The Unified Model runs behind Aus400 use an Arakawa C grid. Scalar
//! quantities sit at cell centres on the `t` grid; the `u` grid is offset
//! half a cell east-west and the `v` grid half a cell north-south. Each
//! layout exists at two resolutions, `d0036` (0.0036 degrees, ~400 m) and
//! `d0198` (0.0198 degrees, ~2.2 km).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Latitude of the domain origin that every Aus400 grid is offset from.
pub const DOMAIN_ORIGIN_LAT: f64 = -27.8;

/// Longitude of the domain origin that every Aus400 grid is offset from.
pub const DOMAIN_ORIGIN_LON: f64 = 133.26;

/// Grid spacing in ten-thousandths of a degree, e.g. `d0036`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution(u32);

impl Resolution {
    /// 0.0036 degree grid (~400 m).
    pub const D0036: Resolution = Resolution(36);
    /// 0.0198 degree grid (~2.2 km).
    pub const D0198: Resolution = Resolution(198);

    /// Every resolution published in the archive.
    pub const KNOWN: [Resolution; 2] = [Self::D0036, Self::D0198];

    /// Look up a published resolution by its spacing in ten-thousandths of a degree.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::KNOWN.iter().copied().find(|r| r.0 == code)
    }

    /// Look up a published resolution from a spacing in degrees.
    ///
    /// The spacing is rounded to four decimal places first.
    pub fn from_spacing(spacing: f64) -> Option<Self> {
        if !spacing.is_finite() {
            return None;
        }
        let code = (spacing.abs() * 10_000.0).round();
        if code < 1.0 || code > u32::MAX as f64 {
            return None;
        }
        Self::from_code(code as u32)
    }

    /// Spacing code in ten-thousandths of a degree.
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Grid spacing in degrees.
    pub fn degrees(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{:04}", self.0)
    }
}

impl FromStr for Resolution {
    type Err = GridIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('d')
            .filter(|d| d.len() == 4 && d.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| GridIdParseError::InvalidFormat(s.to_string()))?;
        let code: u32 = digits
            .parse()
            .map_err(|_| GridIdParseError::InvalidFormat(s.to_string()))?;
        Self::from_code(code).ok_or_else(|| GridIdParseError::UnknownResolution(s.to_string()))
    }
}

impl TryFrom<String> for Resolution {
    type Error = GridIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(resolution: Resolution) -> Self {
        resolution.to_string()
    }
}

/// Position of a variable within an Arakawa C grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stagger {
    /// Cell centres (scalar quantities).
    T,
    /// East-west cell edges.
    U,
    /// North-south cell edges.
    V,
}

impl Stagger {
    /// Single-letter suffix used in grid ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T => "t",
            Self::U => "u",
            Self::V => "v",
        }
    }
}

impl fmt::Display for Stagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stagger {
    type Err = GridIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "t" => Ok(Self::T),
            "u" => Ok(Self::U),
            "v" => Ok(Self::V),
            _ => Err(GridIdParseError::UnknownStagger(s.to_string())),
        }
    }
}

/// A grid of the archive: resolution plus staggering, e.g. `d0036u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridId {
    pub resolution: Resolution,
    pub stagger: Stagger,
}

impl GridId {
    pub const D0198T: GridId = GridId::new(Resolution::D0198, Stagger::T);
    pub const D0036T: GridId = GridId::new(Resolution::D0036, Stagger::T);

    pub const fn new(resolution: Resolution, stagger: Stagger) -> Self {
        Self {
            resolution,
            stagger,
        }
    }

    /// The scalar (`t`) grid at the same resolution.
    pub fn scalar(&self) -> GridId {
        GridId::new(self.resolution, Stagger::T)
    }

    /// Whether this is a scalar (cell centre) grid.
    pub fn is_scalar(&self) -> bool {
        self.stagger == Stagger::T
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.resolution, self.stagger)
    }
}

impl FromStr for GridId {
    type Err = GridIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.is_ascii() {
            return Err(GridIdParseError::InvalidFormat(s.to_string()));
        }
        let (res, sub) = s.split_at(5);
        Ok(GridId::new(res.parse()?, sub.parse()?))
    }
}

impl TryFrom<String> for GridId {
    type Error = GridIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<GridId> for String {
    fn from(grid: GridId) -> Self {
        grid.to_string()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridIdParseError {
    #[error("invalid grid id '{0}', expected e.g. 'd0036t'")]
    InvalidFormat(String),

    #[error("resolution '{0}' is not published in the archive")]
    UnknownResolution(String),

    #[error("unknown grid stagger '{0}', expected one of t, u, v")]
    UnknownStagger(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_display() {
        assert_eq!(Resolution::D0036.to_string(), "d0036");
        assert_eq!(Resolution::D0198.to_string(), "d0198");
    }

    #[test]
    fn test_resolution_from_spacing() {
        assert_eq!(Resolution::from_spacing(0.0036), Some(Resolution::D0036));
        assert_eq!(Resolution::from_spacing(-0.019800001), Some(Resolution::D0198));
        assert_eq!(Resolution::from_spacing(0.01), None);
        assert_eq!(Resolution::from_spacing(f64::NAN), None);
    }

    #[test]
    fn test_grid_id_roundtrip() {
        let id: GridId = "d0036u".parse().unwrap();
        assert_eq!(id, GridId::new(Resolution::D0036, Stagger::U));
        assert_eq!(id.to_string(), "d0036u");
        assert_eq!(id.scalar(), GridId::D0036T);
    }

    #[test]
    fn test_grid_id_parse_errors() {
        assert!(matches!(
            "d0036x".parse::<GridId>(),
            Err(GridIdParseError::UnknownStagger(_))
        ));
        assert!(matches!(
            "d0100t".parse::<GridId>(),
            Err(GridIdParseError::UnknownResolution(_))
        ));
        assert!(matches!(
            "barra".parse::<GridId>(),
            Err(GridIdParseError::InvalidFormat(_))
        ));
    }
}
