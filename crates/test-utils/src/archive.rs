//! On-disk archive fixtures.
//!
//! Tests that only need the catalogue get a temporary archive root holding
//! the sample CSVs. Tests against the real archive locate it through
//! `AUS400_TEST_ARCHIVE` and are skipped when it is absent.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::fixtures::catalogue::{CATALOGUE_CSV, VARIABLES_CSV};

/// Environment variable naming a real archive root for optional tests.
pub const TEST_ARCHIVE_ENV: &str = "AUS400_TEST_ARCHIVE";

/// Root of the real archive, if one is configured and has a catalogue.
pub fn real_archive_root() -> Option<PathBuf> {
    let root = PathBuf::from(std::env::var_os(TEST_ARCHIVE_ENV)?);
    root.join("catalogue.csv").is_file().then_some(root)
}

/// Write `catalogue.csv` and `variables.csv` under `root`.
pub fn write_catalogue(root: &Path, catalogue: &str, variables: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(root)?;
    std::fs::write(root.join("catalogue.csv"), catalogue)?;
    std::fs::write(root.join("variables.csv"), variables)
}

/// A temporary archive root holding the sample catalogue.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub fn sample_archive() -> TempDir {
    let dir = tempfile::Builder::new()
        .prefix("aus400-test-")
        .tempdir()
        .expect("Failed to create temp directory");
    write_catalogue(dir.path(), CATALOGUE_CSV, VARIABLES_CSV)
        .expect("Failed to write sample catalogue");
    dir
}
