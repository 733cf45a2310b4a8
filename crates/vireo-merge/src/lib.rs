//! Delta algebra for Vireo.
//!
//! Two deltas recorded one after the other can be folded into a single delta
//! spanning both. Deltas need not describe adjacent snapshots, so sequences
//! that look impossible (update after remove, create over an existing value)
//! are composed permissively: the result keeps the first delta's `before`
//! and the second delta's `after`.
//!
//! # Key Types
//!
//! - [`merge`] -- Compose two path-keyed deltas
//! - [`merge_maps`] -- The same algebra over any ordered key type
//! - [`merge_entry`] -- Compose a single slot

pub mod algebra;

pub use algebra::{merge, merge_entry, merge_maps};
