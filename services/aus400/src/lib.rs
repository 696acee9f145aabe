//! Command-line access to the Aus400 archive.
//!
//! Exposed as a library so the argument parsing and commands can be tested
//! without spawning the binary.

pub mod args;
pub mod commands;
pub mod summary;

pub use args::{Cli, Command, RegridTarget, SelectionArgs};
pub use commands::{run, Archive};
pub use summary::{FieldSummary, ValueStats};
