//! Command-line arguments.

use std::path::PathBuf;

use aus400_common::time::parse_catalogue_time;
use aus400_common::{Resolution, Selection};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use grid_processor::InterpolationMethod;
use storage::CatalogueFilter;

#[derive(Parser, Debug)]
#[command(name = "aus400")]
#[command(about = "Query and transform the Aus400 regional climate archive")]
pub struct Cli {
    /// Archive root directory (overrides the configuration file)
    #[arg(long, global = true, env = "AUS400_ROOT")]
    pub root: Option<PathBuf>,

    /// Archive configuration file (YAML)
    #[arg(long, global = true, env = "AUS400_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List catalogue entries matching the selection
    Search {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Report the grid each selected dataset lives on
    Identify {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Extract a horizontal cross-section between two points
    Section {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Start longitude
        #[arg(long, allow_negative_numbers = true)]
        x0: f64,

        /// Start latitude
        #[arg(long, allow_negative_numbers = true)]
        y0: f64,

        /// End longitude
        #[arg(long, allow_negative_numbers = true)]
        x1: f64,

        /// End latitude
        #[arg(long, allow_negative_numbers = true)]
        y1: f64,

        /// Number of points along the section (default: from the data resolution)
        #[arg(long)]
        points: Option<usize>,

        /// Sampling method: linear or nearest
        #[arg(long)]
        method: Option<InterpolationMethod>,
    },

    /// Regrid a dataset onto another grid
    Regrid {
        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(long, value_enum, default_value_t = RegridTarget::D0198t)]
        target: RegridTarget,
    },

    /// Interpolate model-level data onto pressure or height levels
    Levels {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Pressure levels in Pa, comma separated
        #[arg(long, value_delimiter = ',', conflicts_with = "height", required_unless_present = "height")]
        pressure: Vec<f64>,

        /// Heights in m, comma separated
        #[arg(long, value_delimiter = ',')]
        height: Vec<f64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegridTarget {
    /// The 2.2 km scalar grid
    #[value(name = "d0198t")]
    D0198t,
    /// The scalar grid of the dataset's own resolution
    Scalar,
    /// The external reanalysis grid
    Reference,
    /// Bilinear interpolation of a wind component onto the scalar grid
    Vector,
}

/// Catalogue columns shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Resolution, e.g. d0198
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// Output stream, e.g. mdl
    #[arg(long)]
    pub stream: Option<String>,

    /// Variable name, e.g. air_temp
    #[arg(long)]
    pub variable: Option<String>,

    /// Ensemble member, or an inclusive range `A:B`
    #[arg(long, value_parser = parse_ensemble)]
    pub ensemble: Option<Selection<i64>>,

    /// File time `YYYYMMDDTHHMM`, or an inclusive range `A:B`
    #[arg(long, value_parser = parse_time)]
    pub time: Option<Selection<NaiveDateTime>>,

    /// Run identifier
    #[arg(long)]
    pub runid: Option<String>,
}

impl From<&SelectionArgs> for CatalogueFilter {
    fn from(args: &SelectionArgs) -> Self {
        Self {
            resolution: args.resolution,
            stream: args.stream.clone(),
            variable: args.variable.clone(),
            ensemble: args.ensemble,
            time: args.time,
            runid: args.runid.clone(),
        }
    }
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    s.parse().map_err(|e| format!("{}", e))
}

/// Parses `value` or `lo:hi` into a [`Selection`].
pub fn parse_selection<T, E>(s: &str, parse: impl Fn(&str) -> Result<T, E>) -> Result<Selection<T>, String>
where
    E: std::fmt::Display,
{
    let parse = |v: &str| parse(v.trim()).map_err(|e| format!("invalid value '{}': {}", v, e));
    match s.split_once(':') {
        Some((lo, hi)) => Ok(Selection::Range(parse(lo)?, parse(hi)?)),
        None => Ok(Selection::Exact(parse(s)?)),
    }
}

fn parse_ensemble(s: &str) -> Result<Selection<i64>, String> {
    parse_selection(s, str::parse::<i64>)
}

fn parse_time(s: &str) -> Result<Selection<NaiveDateTime>, String> {
    parse_selection(s, parse_catalogue_time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_forms() {
        assert_eq!(parse_ensemble("3").unwrap(), Selection::Exact(3));
        assert_eq!(parse_ensemble("0:2").unwrap(), Selection::Range(0, 2));
        assert!(parse_ensemble("x").is_err());

        let t = parse_time("20170328T0600:20170328T1200").unwrap();
        assert!(matches!(t, Selection::Range(a, b) if a < b));
        assert!(parse_time("2017-03-28").is_err());
    }

    #[test]
    fn test_selection_to_filter() {
        let args = SelectionArgs {
            resolution: Some(Resolution::D0198),
            variable: Some("air_temp".to_string()),
            ensemble: Some(Selection::Exact(1)),
            ..Default::default()
        };
        let filter = CatalogueFilter::from(&args);
        assert_eq!(filter.resolution, Some(Resolution::D0198));
        assert_eq!(filter.variable.as_deref(), Some("air_temp"));
        assert_eq!(filter.stream, None);
        assert_eq!(filter.ensemble, Some(Selection::Exact(1)));
    }
}
