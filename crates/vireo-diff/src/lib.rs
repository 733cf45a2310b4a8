//! Diff engine for Vireo.
//!
//! Compares two value graphs and produces a [`Delta`](vireo_types::Delta):
//! a map from dotted paths to `[before, after]` pairs describing every leaf
//! that differs. Array indices are treated as keys, so removing an item from
//! the front of an array shows up as a run of updates followed by a removal.
//! Self-referential graphs are handled without looping.
//!
//! # Key Types
//!
//! - [`diff`] / [`diff_at`] -- Compute a delta, optionally under a path prefix
//! - [`DeltaSummary`] -- Per-kind tally of a delta

pub mod structural;
pub mod summary;

pub use structural::{diff, diff_at};
pub use summary::{summarize, DeltaSummary};
