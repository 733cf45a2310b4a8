//! Incremental collection reconciler for Vireo.
//!
//! A [`Reconciler`] is the render hook of a widget whose state holds an array
//! of models. It turns each structural delta into per-index create, update
//! and remove calls against views managed by a [`Lifecycle`], either within
//! the `set` call or spread across scheduled drain steps when the change is
//! large.
//!
//! # Key Types
//!
//! - [`Reconciler`] / [`Drain`] -- Pending map, work queue and drain state
//! - [`Group`] -- Shared handle that owns scheduled continuations
//! - [`Lifecycle`] / [`KeyPolicy`] / [`ObjectViews`] -- View strategies
//! - [`GroupConfig`] -- Thresholds, keying and drain method
//! - [`Scheduler`] / [`TaskQueue`] / [`FrameScheduler`] / [`TimerScheduler`] -- Deferred execution
//! - [`WorkQueue`] -- FIFO of pending indices

pub mod config;
pub mod error;
pub mod group;
pub mod lifecycle;
pub mod queue;
pub mod reconciler;
pub mod schedule;

pub use config::GroupConfig;
pub use error::{ConfigError, ReconcileError, ReconcileResult};
pub use group::Group;
pub use lifecycle::{KeyPolicy, Lifecycle, ObjectViews};
pub use queue::WorkQueue;
pub use reconciler::{Continuation, Drain, Reconciler};
pub use schedule::{FrameScheduler, Scheduler, Task, TaskQueue, TimerScheduler};
