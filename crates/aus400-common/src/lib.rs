//! Common types shared across the Aus400 archive tools.

pub mod bbox;
pub mod error;
pub mod field;
pub mod grid;
pub mod query;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{FieldError, FieldResult, LookupError};
pub use field::{dims, Coordinate, Field, SectionEndpoints};
pub use grid::{GridId, Resolution, Stagger, DOMAIN_ORIGIN_LAT, DOMAIN_ORIGIN_LON};
pub use query::{DatasetQuery, Selection};
