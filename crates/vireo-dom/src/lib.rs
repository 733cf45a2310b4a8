//! View targets for Vireo.
//!
//! The reconciler never touches elements itself; a [`Lifecycle`] does. This
//! crate provides the element-backed one, [`ListViews`], along with the
//! primitives it is written against.
//!
//! # Key Types
//!
//! - [`ViewTarget`] -- Element primitives (find, clone, append, text, attributes, detach)
//! - [`Handle`] / [`Selection`] -- A raw element or a wrapped selection, used interchangeably
//! - [`Node`] -- In-memory element tree
//! - [`ListViews`] -- Template-cloning list lifecycle
//! - [`Selector`] -- `tag`, `#id` and `.class` compound selectors
//!
//! [`Lifecycle`]: vireo_reconcile::Lifecycle

pub mod error;
pub mod list;
pub mod memory;
pub mod selector;
pub mod setter;
pub mod target;

pub use error::{DomError, DomResult};
pub use list::{ListViews, Populate};
pub use memory::Node;
pub use selector::Selector;
pub use setter::set_if_changed;
pub use target::{Handle, Selection, ViewTarget};
