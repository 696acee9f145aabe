//! Shared test utilities for the Aus400 workspace.
//!
//! - Synthetic fields on exact Aus400 grids and bilinear weight generators
//! - Sample catalogue contents, common levels and bounding boxes
//! - Temporary archive roots, and a skip macro for tests that need the
//!   real archive
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod archive;
pub mod fixtures;
pub mod generators;

pub use archive::*;
pub use fixtures::*;
pub use generators::*;

/// Evaluates to the real archive root, or skips the test when none is
/// configured.
///
/// ```ignore
/// #[test]
/// fn test_real_catalogue() {
///     let root = test_utils::require_archive!();
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! require_archive {
    () => {{
        match $crate::real_archive_root() {
            Some(root) => root,
            None => {
                eprintln!(
                    "SKIPPED: no archive found. Set {} to an Aus400 archive root.",
                    $crate::TEST_ARCHIVE_ENV
                );
                return;
            }
        }
    }};
}

/// Approximate floating-point equality.
///
/// ```ignore
/// assert_approx_eq!(1.0001, 1.0, 0.001); // passes
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
