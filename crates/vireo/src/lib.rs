//! Vireo: structural diffing and incremental collection rendering.
//!
//! Application state lives in widgets. Every assignment is diffed against the
//! previous state, and collection widgets turn the resulting delta into the
//! smallest set of create, update and remove calls on their views. Large
//! changes can be spread across turns of the host's event loop.
//!
//! This crate re-exports the public surface of the `vireo-*` crates and adds
//! a [`ListBuilder`] for element-backed lists.
//!
//! ```
//! use vireo::prelude::*;
//!
//! # fn main() -> VireoResult<()> {
//! let ul = Node::new("ul").with_child(Node::new("li"));
//! let list = ListBuilder::new("my-list", ul.clone())
//!     .config(GroupConfig::synchronous())
//!     .build([("data", Value::array([1, 2, 3]))])?;
//! assert_eq!(ul.text(), "123");
//!
//! list.set([("data", Value::array([3, 2]))])?;
//! assert_eq!(ul.text(), "32");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;

pub use builder::{List, ListBuilder};
pub use error::{VireoError, VireoResult};

pub use vireo_diff::{diff, diff_at, summarize, DeltaSummary};
pub use vireo_dom::{set_if_changed, DomError, Handle, ListViews, Node, Selection, Selector, ViewTarget};
pub use vireo_merge::{merge, merge_entry, merge_maps};
pub use vireo_reconcile::{
    ConfigError, Drain, FrameScheduler, Group, GroupConfig, KeyPolicy, Lifecycle, ObjectViews,
    ReconcileError, Reconciler, Scheduler, TaskQueue, TimerScheduler, WorkQueue,
};
pub use vireo_types::{Change, Delta, Entry, Kind, Path, Value};
pub use vireo_widget::{Emitter, Event, Hooks, Plain, RenderMode, Rendered, Widget, WidgetError};

/// Everything needed to build and drive widgets.
pub mod prelude {
    pub use crate::{
        diff, merge, Change, Delta, Drain, Entry, Event, Group, GroupConfig, Handle, KeyPolicy,
        Lifecycle, List, ListBuilder, Node, ObjectViews, RenderMode, TaskQueue, Value, ViewTarget,
        VireoError, VireoResult, Widget,
    };
}
