//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use aus400_common::{dims, DatasetQuery, Field, GridId, LookupError, Resolution};
use grid_processor::{DatasetLookup, WeightsSource, WeightsTable};
use test_utils::bilinear_weights;

/// Datasets keyed by `resolution.stream.variable`, recording every query.
#[derive(Default)]
pub struct InMemoryLookup {
    fields: HashMap<String, Field>,
    pub queries: RefCell<Vec<DatasetQuery>>,
}

impl InMemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolution: Resolution, stream: &str, variable: &str, field: Field) -> Self {
        self.fields
            .insert(format!("{resolution}.{stream}.{variable}"), field);
        self
    }
}

impl DatasetLookup for InMemoryLookup {
    fn load(&self, query: &DatasetQuery) -> Result<Field, LookupError> {
        self.queries.borrow_mut().push(query.clone());
        let key = format!("{}.{}.{}", query.resolution, query.stream, query.variable);
        self.fields
            .get(&key)
            .cloned()
            .ok_or_else(|| LookupError::EmptySelection(query.to_string()))
    }
}

/// Weights tables keyed by source grid and target name.
#[derive(Default)]
pub struct InMemoryWeights {
    tables: HashMap<(GridId, String), Arc<WeightsTable>>,
}

impl InMemoryWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, table: WeightsTable) -> Self {
        self.tables
            .insert((*table.source(), table.target().to_string()), Arc::new(table));
        self
    }
}

impl WeightsSource for InMemoryWeights {
    fn load_weights(&self, source: &GridId, target: &str) -> Result<Arc<WeightsTable>, LookupError> {
        self.tables
            .get(&(*source, target.to_string()))
            .cloned()
            .ok_or_else(|| LookupError::MissingWeights {
                source_grid: source.to_string(),
                target_grid: target.to_string(),
            })
    }
}

/// Bilinear weights from the grid of `field` onto the given target axes.
pub fn weights_for(
    field: &Field,
    source: GridId,
    target: &str,
    target_lats: Vec<f64>,
    target_lons: Vec<f64>,
) -> WeightsTable {
    let lats = field.dim_coord(dims::LATITUDE).unwrap();
    let lons = field.dim_coord(dims::LONGITUDE).unwrap();
    let triplets = bilinear_weights(lats, lons, &target_lats, &target_lons);
    WeightsTable::from_triplets(
        source,
        target,
        (lats.len(), lons.len()),
        target_lats,
        target_lons,
        triplets,
    )
    .unwrap()
}
