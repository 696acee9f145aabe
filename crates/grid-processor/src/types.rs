//! Sampling options shared by the cross-section and regrid paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How values are sampled between grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Value of the closest grid point.
    Nearest,
    /// Bilinear in the horizontal, linear along a single axis.
    #[default]
    Linear,
}

impl FromStr for InterpolationMethod {
    type Err = String;

    /// Case-insensitive; `bilinear` is accepted as an alias of `linear`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" | "bilinear" => Ok(Self::Linear),
            other => Err(format!(
                "unknown interpolation method '{}', expected linear or nearest",
                other
            )),
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
        })
    }
}

/// Number of samples along a cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointCount {
    /// As many points as the denser of the clipped latitude/longitude axes.
    #[default]
    Auto,
    /// Exactly this many points, evenly spaced between the endpoints.
    Fixed(usize),
}

impl PointCount {
    pub fn fixed(&self) -> Option<usize> {
        match self {
            Self::Auto => None,
            Self::Fixed(n) => Some(*n),
        }
    }
}

impl From<Option<usize>> for PointCount {
    fn from(n: Option<usize>) -> Self {
        n.map_or(Self::Auto, Self::Fixed)
    }
}
