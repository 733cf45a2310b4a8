//! Foundation types for Vireo.
//!
//! Every other Vireo crate depends on `vireo-types`.
//!
//! # Key Types
//!
//! - [`Value`] -- tagged dynamic value with shared composite containers
//! - [`Path`] / [`Segment`] -- parsed dotted property paths
//! - [`Change`] -- a `[before, after]` pair
//! - [`Entry`] / [`Kind`] -- one delta slot and its classification
//! - [`Delta`] -- path-keyed collection of slots

pub mod delta;
pub mod error;
pub mod path;
pub mod value;

pub use delta::{Change, Delta, Entry, Kind};
pub use error::{PathError, TypeError};
pub use path::{is_ancestor_or_self, join, Path, Segment, PATH_DELIMITER};
pub use value::{Array, ElementId, Map, Object, Value};
