//! Precomputed regridding weights from the archive's `grids/` directory.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use aus400_common::{GridId, LookupError};
use grid_processor::{WeightsSource, WeightsTable};
use lru::LruCache;
use netcdf_parser::read_esmf_weights;
use tracing::{debug, info};

use crate::config::ArchiveConfig;
use crate::error::{StorageError, StorageResult};

/// Statistics for the weights cache
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WeightsCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl WeightsCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct CacheState {
    tables: LruCache<String, Arc<WeightsTable>>,
    stats: WeightsCacheStats,
}

/// Weights tables read on demand and kept in an LRU cache.
///
/// # Cache Key Format
/// Keys are weights file names, e.g. `weights_d0036u_to_d0036t.nc`.
pub struct ArchiveWeights {
    grids: PathBuf,
    state: Mutex<CacheState>,
    capacity: usize,
}

impl ArchiveWeights {
    pub fn new(config: &ArchiveConfig) -> Self {
        let capacity = config.weights_cache_entries.max(1);
        let cache_size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            grids: config.root.join("grids"),
            state: Mutex::new(CacheState {
                tables: LruCache::new(cache_size),
                stats: WeightsCacheStats::default(),
            }),
            capacity,
        }
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> WeightsCacheStats {
        match self.state.lock() {
            Ok(state) => WeightsCacheStats {
                entries: state.tables.len(),
                ..state.stats.clone()
            },
            Err(_) => WeightsCacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Load (or fetch from cache) the weights from `source` to `target`.
    pub fn get(&self, source: &GridId, target: &str) -> StorageResult<Arc<WeightsTable>> {
        let key = ArchiveConfig::weights_file_name(source, target);

        {
            let mut state = self.lock()?;
            if let Some(table) = state.tables.get(&key).cloned() {
                state.stats.hits += 1;
                debug!(key = %key, "Weights cache hit");
                return Ok(table);
            }
            state.stats.misses += 1;
        }

        let path = self.grids.join(&key);
        if !path.exists() {
            return Err(LookupError::MissingWeights {
                source_grid: source.to_string(),
                target_grid: target.to_string(),
            }
            .into());
        }

        info!(path = %path.display(), "Loading regridding weights");
        let esmf = read_esmf_weights(&path)?;
        let (target_lats, target_lons) = esmf.target_axes()?;
        let table = WeightsTable::from_triplets(
            *source,
            target,
            esmf.source_shape()?,
            target_lats,
            target_lons,
            esmf.triplets()?,
        )
        .map_err(|e| StorageError::InvalidWeights {
            file: key.clone(),
            reason: e.to_string(),
        })?;
        let table = Arc::new(table);

        self.lock()?.tables.put(key, Arc::clone(&table));
        Ok(table)
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, CacheState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::CachePoisoned)
    }
}

impl WeightsSource for ArchiveWeights {
    fn load_weights(&self, source: &GridId, target: &str) -> Result<Arc<WeightsTable>, LookupError> {
        self.get(source, target).map_err(LookupError::from)
    }
}
