//! Configuration for the grid processor.

use crate::types::InterpolationMethod;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for the grid processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridProcessorConfig {
    /// Interpolation method for cross-sections.
    pub interpolation: InterpolationMethod,

    /// Name of the external reanalysis grid targeted by `to_reference_grid`.
    pub reference_grid: String,

    /// Stream of the variable whose coordinates `regrid_vector` interpolates onto.
    pub vector_reference_stream: String,

    /// Variable whose coordinates `regrid_vector` interpolates onto.
    pub vector_reference_variable: String,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationMethod::Linear,
            reference_grid: "barra_r".to_string(),
            vector_reference_stream: "fx".to_string(),
            vector_reference_variable: "lnd_mask".to_string(),
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_INTERPOLATION") {
            match val.parse() {
                Ok(method) => config.interpolation = method,
                Err(e) => warn!(error = %e, "Ignoring GRID_INTERPOLATION"),
            }
        }

        if let Ok(val) = std::env::var("AUS400_REFERENCE_GRID") {
            config.reference_grid = val;
        }

        // Given as "<stream>.<variable>", e.g. "fx.lnd_mask"
        if let Ok(val) = std::env::var("AUS400_VECTOR_REFERENCE") {
            if let Some((stream, variable)) = val.split_once('.') {
                config.vector_reference_stream = stream.to_string();
                config.vector_reference_variable = variable.to_string();
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.reference_grid.trim().is_empty() {
            return Err("reference_grid must not be empty".to_string());
        }

        if self.vector_reference_stream.trim().is_empty()
            || self.vector_reference_variable.trim().is_empty()
        {
            return Err("vector reference stream and variable must not be empty".to_string());
        }

        Ok(())
    }
}
