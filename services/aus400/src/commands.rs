//! Command execution against an opened archive.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use aus400_common::SectionEndpoints;
use grid_processor::{
    cross_sec_along, identify_grid, GridProcessorConfig, Regridder, VerticalInterpolator,
};
use serde_json::{json, Value};
use storage::{ArchiveConfig, ArchiveWeights, Catalogue, CatalogueFilter};
use tracing::info;

use crate::args::{Command, RegridTarget};
use crate::summary::FieldSummary;

/// Catalogue and weights of one archive, with the processing settings.
pub struct Archive {
    pub catalogue: Catalogue,
    pub weights: ArchiveWeights,
    pub processing: GridProcessorConfig,
}

impl Archive {
    pub fn open(config: &ArchiveConfig, processing: GridProcessorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid archive configuration: {}", e))?;
        processing
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid processing configuration: {}", e))?;

        let catalogue = Catalogue::open(config)
            .with_context(|| format!("failed to open catalogue under {}", config.root.display()))?;
        Ok(Self {
            catalogue,
            weights: ArchiveWeights::new(config),
            processing,
        })
    }

    fn load(&self, filter: &CatalogueFilter) -> Result<aus400_common::Field> {
        self.catalogue
            .load(filter)
            .with_context(|| format!("failed to load {}", filter))
    }
}

/// Run `command`, returning its JSON output.
pub fn run(command: &Command, archive: &Archive) -> Result<Value> {
    match command {
        Command::Search { selection } => {
            let filter = CatalogueFilter::from(selection);
            let entries = archive.catalogue.filter(&filter);
            info!(%filter, matches = entries.len(), "Searched catalogue");
            Ok(serde_json::to_value(entries)?)
        }

        Command::Identify { selection } => {
            let filter = CatalogueFilter::from(selection);
            let datasets = archive.catalogue.load_all(&filter)?;
            let mut grids = BTreeMap::new();
            for (key, field) in &datasets {
                let grid = identify_grid(field)
                    .with_context(|| format!("cannot identify the grid of {}", key))?;
                grids.insert(key.clone(), grid.to_string());
            }
            Ok(serde_json::to_value(grids)?)
        }

        Command::Section {
            selection,
            x0,
            y0,
            x1,
            y1,
            points,
            method,
        } => {
            let field = archive.load(&CatalogueFilter::from(selection))?;
            let section = SectionEndpoints {
                x0: *x0,
                y0: *y0,
                x1: *x1,
                y1: *y1,
                num_points: *points,
            };
            let method = method.unwrap_or(archive.processing.interpolation);
            let result = cross_sec_along(&field, &section, method)?;
            Ok(serde_json::to_value(FieldSummary::of(&result))?)
        }

        Command::Regrid { selection, target } => {
            let field = archive.load(&CatalogueFilter::from(selection))?;
            let regridder = Regridder::new(
                &archive.weights,
                &archive.catalogue,
                archive.processing.clone(),
            );
            let result = match target {
                RegridTarget::D0198t => regridder.to_d0198t(&field)?.into_owned(),
                RegridTarget::Scalar => regridder.to_scalar_grid(&field)?.into_owned(),
                RegridTarget::Reference => regridder.to_reference_grid(&field)?,
                RegridTarget::Vector => regridder.regrid_vector(&field)?,
            };
            let stats = archive.weights.stats();
            info!(
                hits = stats.hits,
                misses = stats.misses,
                hit_rate = format!("{:.1}%", stats.hit_rate()),
                "Weights cache"
            );
            Ok(serde_json::to_value(FieldSummary::of(&result))?)
        }

        Command::Levels {
            selection,
            pressure,
            height,
        } => {
            let field = archive.load(&CatalogueFilter::from(selection))?;
            let interpolator =
                VerticalInterpolator::new(&archive.catalogue, archive.processing.clone());
            let result = if pressure.is_empty() {
                interpolator.to_height_levels(&field, height)?
            } else {
                interpolator.to_pressure_levels(&field, pressure)?
            };
            Ok(json!({
                "levels": if pressure.is_empty() { height } else { pressure },
                "field": FieldSummary::of(&result),
            }))
        }
    }
}
