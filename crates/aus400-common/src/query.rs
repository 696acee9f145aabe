//! Dataset queries against the archive catalogue.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Resolution;

/// Selects a single value or an inclusive range of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Selection<T> {
    Exact(T),
    Range(T, T),
}

impl<T: PartialOrd + Copy> Selection<T> {
    /// Whether `value` is selected. Range ends may be given in either order.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Exact(v) => value == v,
            Self::Range(a, b) => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                value >= lo && value <= hi
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{}", v),
            Self::Range(a, b) => write!(f, "{}..={}", a, b),
        }
    }
}

/// Descriptive keys identifying files in the archive.
///
/// `resolution`, `stream` and `variable` are always required; the other keys
/// narrow the selection when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuery {
    pub resolution: Resolution,
    pub stream: String,
    pub variable: String,
    pub ensemble: Option<Selection<i64>>,
    pub time: Option<Selection<NaiveDateTime>>,
    pub runid: Option<String>,
}

impl DatasetQuery {
    pub fn new(resolution: Resolution, stream: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            resolution,
            stream: stream.into(),
            variable: variable.into(),
            ensemble: None,
            time: None,
            runid: None,
        }
    }

    pub fn with_ensemble(mut self, ensemble: Selection<i64>) -> Self {
        self.ensemble = Some(ensemble);
        self
    }

    pub fn with_time(mut self, time: Selection<NaiveDateTime>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_runid(mut self, runid: impl Into<String>) -> Self {
        self.runid = Some(runid.into());
        self
    }
}

impl fmt::Display for DatasetQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.resolution, self.stream, self.variable)?;
        if let Some(ensemble) = &self.ensemble {
            write!(f, " ensemble={}", ensemble)?;
        }
        if let Some(time) = &self.time {
            write!(f, " time={}", time)?;
        }
        if let Some(runid) = &self.runid {
            write!(f, " runid={}", runid)?;
        }
        Ok(())
    }
}
