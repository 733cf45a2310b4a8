//! Widget lifecycle shell for Vireo.
//!
//! A widget holds a state object addressed by dotted paths. Assigning
//! properties computes a structural delta of what changed, announces it as a
//! `change` event, and hands it to the widget's render hook. Collection
//! reconcilers plug in as hooks.
//!
//! # Key Types
//!
//! - [`Widget`] -- State, events and hooks of one widget
//! - [`Hooks`] / [`Context`] / [`Rendered`] -- The pluggable lifecycle
//! - [`RenderMode`] -- When `set_with` renders
//! - [`Emitter`] / [`Event`] / [`SubscriptionId`] -- Named observations with wildcard delivery
//! - [`WidgetError`] -- Errors from the shell itself

pub mod error;
pub mod events;
pub mod widget;

pub use error::{WidgetError, WidgetResult};
pub use events::{Emitter, Event, SubscriptionId, WILDCARD};
pub use widget::{Context, Hooks, Plain, RenderMode, Rendered, Widget};
