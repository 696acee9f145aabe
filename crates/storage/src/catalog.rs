//! The archive catalogue.
//!
//! `catalogue.csv` lists every file in the archive with the keys that
//! identify it; `variables.csv` describes each `(variable, stream)` pair.
//! The two are joined when the catalogue is opened, and rows without a
//! variable description are dropped.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use aus400_common::time::{parse_catalogue_time, to_epoch_seconds, CATALOGUE_TIME_FORMAT};
use aus400_common::{dims, DatasetQuery, Field, LookupError, Resolution, Selection};
use chrono::NaiveDateTime;
use grid_processor::DatasetLookup;
use netcdf_parser::read_field;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ArchiveConfig;
use crate::error::{StorageError, StorageResult};

/// One archive file, with its variable description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub runid: String,
    pub resolution: Resolution,
    pub ensemble: i64,
    pub stream: String,
    pub variable: String,
    /// First timestamp in the file
    #[serde(with = "catalogue_time")]
    pub time: NaiveDateTime,
    /// Path relative to the archive root
    pub path: String,
    pub standard_name: Option<String>,
    pub description: Option<String>,
    pub methods: Option<String>,
}

impl CatalogueEntry {
    /// Key of the dataset this file belongs to, `resolution.stream.variable`.
    pub fn dataset_key(&self) -> String {
        format!("{}.{}.{}", self.resolution, self.stream, self.variable)
    }
}

/// Row of `catalogue.csv`.
#[derive(Debug, Deserialize)]
struct FileRow {
    runid: String,
    resolution: Resolution,
    ensemble: i64,
    stream: String,
    variable: String,
    time: String,
    path: String,
}

/// Row of `variables.csv`.
#[derive(Debug, Deserialize)]
struct VariableRow {
    variable: String,
    stream: String,
    standard_name: Option<String>,
    description: Option<String>,
    methods: Option<String>,
}

/// Catalogue columns to match on. Unset columns match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueFilter {
    pub resolution: Option<Resolution>,
    pub stream: Option<String>,
    pub variable: Option<String>,
    pub ensemble: Option<Selection<i64>>,
    pub time: Option<Selection<NaiveDateTime>>,
    pub runid: Option<String>,
}

impl CatalogueFilter {
    pub fn matches(&self, entry: &CatalogueEntry) -> bool {
        self.resolution.map_or(true, |r| r == entry.resolution)
            && self.stream.as_ref().map_or(true, |s| *s == entry.stream)
            && self.variable.as_ref().map_or(true, |v| *v == entry.variable)
            && self.ensemble.map_or(true, |e| e.matches(&entry.ensemble))
            && self.time.map_or(true, |t| t.matches(&entry.time))
            && self.runid.as_ref().map_or(true, |r| *r == entry.runid)
    }
}

impl From<&DatasetQuery> for CatalogueFilter {
    fn from(query: &DatasetQuery) -> Self {
        Self {
            resolution: Some(query.resolution),
            stream: Some(query.stream.clone()),
            variable: Some(query.variable.clone()),
            ensemble: query.ensemble,
            time: query.time,
            runid: query.runid.clone(),
        }
    }
}

impl fmt::Display for CatalogueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(r) = &self.resolution {
            parts.push(format!("resolution={}", r));
        }
        if let Some(s) = &self.stream {
            parts.push(format!("stream={}", s));
        }
        if let Some(v) = &self.variable {
            parts.push(format!("variable={}", v));
        }
        if let Some(e) = &self.ensemble {
            parts.push(format!("ensemble={}", e));
        }
        if let Some(t) = &self.time {
            let fmt_time = |t: &NaiveDateTime| t.format(CATALOGUE_TIME_FORMAT).to_string();
            parts.push(match t {
                Selection::Exact(t) => format!("time={}", fmt_time(t)),
                Selection::Range(a, b) => format!("time={}..={}", fmt_time(a), fmt_time(b)),
            });
        }
        if let Some(r) = &self.runid {
            parts.push(format!("runid={}", r));
        }
        if parts.is_empty() {
            f.write_str("<everything>")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

/// The archive catalogue, resolved against an archive root.
#[derive(Debug, Clone)]
pub struct Catalogue {
    root: PathBuf,
    entries: Vec<CatalogueEntry>,
}

impl Catalogue {
    /// Read and join `catalogue.csv` and `variables.csv` under the archive root.
    pub fn open(config: &ArchiveConfig) -> StorageResult<Self> {
        let files = std::fs::File::open(config.catalogue_path())?;
        let variables = std::fs::File::open(config.variables_path())?;
        let catalogue = Self::from_readers(&config.root, files, variables)?;
        info!(
            root = %config.root.display(),
            entries = catalogue.entries.len(),
            "Opened catalogue"
        );
        Ok(catalogue)
    }

    /// Join catalogue and variable CSV contents.
    pub fn from_readers(
        root: impl Into<PathBuf>,
        catalogue: impl Read,
        variables: impl Read,
    ) -> StorageResult<Self> {
        let mut described: HashMap<(String, String), VariableRow> = HashMap::new();
        for row in csv::Reader::from_reader(variables).deserialize() {
            let row: VariableRow = row?;
            described.insert((row.variable.clone(), row.stream.clone()), row);
        }

        let mut entries = Vec::new();
        let mut undescribed = 0usize;
        for (i, row) in csv::Reader::from_reader(catalogue).deserialize().enumerate() {
            let row: FileRow = row?;
            let time = parse_catalogue_time(&row.time)
                .map_err(|e| StorageError::invalid_row(i + 2, e))?;
            let Some(var) = described.get(&(row.variable.clone(), row.stream.clone())) else {
                undescribed += 1;
                continue;
            };
            entries.push(CatalogueEntry {
                runid: row.runid,
                resolution: row.resolution,
                ensemble: row.ensemble,
                stream: row.stream,
                variable: row.variable,
                time,
                path: row.path,
                standard_name: var.standard_name.clone(),
                description: var.description.clone(),
                methods: var.methods.clone(),
            });
        }

        if undescribed > 0 {
            debug!(undescribed, "Dropped catalogue rows without a variable description");
        }
        Ok(Self::from_rows(root, entries))
    }

    pub fn from_rows(root: impl Into<PathBuf>, entries: Vec<CatalogueEntry>) -> Self {
        Self {
            root: root.into(),
            entries,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    /// Rows matching `filter`, in catalogue order.
    pub fn filter(&self, filter: &CatalogueFilter) -> Vec<&CatalogueEntry> {
        let rows: Vec<_> = self.entries.iter().filter(|e| filter.matches(e)).collect();
        debug!(%filter, rows = rows.len(), "Filtered catalogue");
        rows
    }

    /// Load every dataset matching `filter`, keyed `resolution.stream.variable`.
    ///
    /// Files of one ensemble member are joined along `time` in time order.
    /// Several members are stacked along a new leading `ensemble`
    /// dimension; a single member is recorded as a scalar `ensemble`
    /// coordinate.
    pub fn load_all(&self, filter: &CatalogueFilter) -> StorageResult<BTreeMap<String, Field>> {
        let mut groups: BTreeMap<(Resolution, &str, &str), BTreeMap<i64, Vec<&CatalogueEntry>>> =
            BTreeMap::new();
        for entry in self.filter(filter) {
            groups
                .entry((entry.resolution, entry.stream.as_str(), entry.variable.as_str()))
                .or_default()
                .entry(entry.ensemble)
                .or_default()
                .push(entry);
        }

        let mut results = BTreeMap::new();
        for ((resolution, stream, variable), members) in groups {
            let mut stacked = Vec::with_capacity(members.len());
            for (ensemble, mut files) in members {
                files.sort_by_key(|e| e.time);
                let member = self.load_member(variable, &files)?;
                stacked.push(member.with_scalar_coord(dims::ENSEMBLE, ensemble as f64));
            }

            let field = if stacked.len() == 1 {
                stacked.remove(0)
            } else {
                let parts = stacked
                    .iter()
                    .map(|f| f.expand_dims(dims::ENSEMBLE, 0))
                    .collect::<Result<Vec<_>, _>>()?;
                Field::concat(dims::ENSEMBLE, &parts)?
            };

            let key = format!("{}.{}.{}", resolution, stream, variable);
            results.insert(
                key,
                field
                    .with_attr("resolution", resolution.to_string())
                    .with_attr("stream", stream),
            );
        }
        Ok(results)
    }

    /// Load the single dataset matching `filter`.
    pub fn load(&self, filter: &CatalogueFilter) -> StorageResult<Field> {
        let mut results = self.load_all(filter)?;
        if results.len() > 1 {
            let keys: Vec<_> = results.keys().cloned().collect();
            return Err(LookupError::AmbiguousSelection(keys.join(", ")).into());
        }
        results
            .pop_first()
            .map(|(_, field)| field)
            .ok_or_else(|| LookupError::EmptySelection(filter.to_string()).into())
    }

    fn load_member(&self, variable: &str, files: &[&CatalogueEntry]) -> StorageResult<Field> {
        let mut parts = Vec::with_capacity(files.len());
        for entry in files {
            let path = self.root.join(&entry.path);
            info!(path = %path.display(), variable, "Loading archive file");
            let mut field = read_field(&path, variable)?;
            if !field.has_dim(dims::TIME) && files.len() > 1 {
                // Single-time files without a time axis are stamped with their catalogue time
                field = field
                    .with_scalar_coord(dims::TIME, to_epoch_seconds(entry.time))
                    .expand_dims(dims::TIME, 0)?;
            }
            parts.push(field);
        }
        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        Ok(Field::concat(dims::TIME, &parts)?)
    }
}

impl DatasetLookup for Catalogue {
    fn load(&self, query: &DatasetQuery) -> Result<Field, LookupError> {
        Catalogue::load(self, &CatalogueFilter::from(query)).map_err(LookupError::from)
    }
}

/// Serde adapter for catalogue timestamps such as `20170328T1200`.
mod catalogue_time {
    use aus400_common::time::CATALOGUE_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(CATALOGUE_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, CATALOGUE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
