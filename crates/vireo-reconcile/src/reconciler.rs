//! Incremental reconciliation of a model array against its views.
//!
//! Each render collects the changed indices of the collection property into a
//! pending map (index → delta slot), merges it with whatever is still pending
//! from earlier renders, and rebuilds the work queue from the pending keys in
//! ascending order. Small batches drain within the call. Batches larger than
//! `large_change` drain one index per scheduled step when `async_render` is
//! on; every step schedules `drain_growth` more steps until the queue is
//! empty. The views are then compacted, views that no current model keys to
//! are removed, and `render` fires.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};
use vireo_merge::merge_maps;
use vireo_types::{is_ancestor_or_self, Change, Delta, Entry, Kind, Path, Value, PATH_DELIMITER};
use vireo_widget::events::{CREATE, REMOVE, RENDER, UPDATE};
use vireo_widget::{Context, Hooks, Rendered};

use crate::config::GroupConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::lifecycle::Lifecycle;
use crate::queue::WorkQueue;

/// Outcome of one [`Reconciler::drain`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drain {
    /// Nothing was queued.
    Idle,
    /// One index was reconciled and more remain.
    Stepped,
    /// The last queued index was reconciled; views are compacted.
    Finished,
}

/// A callback that runs one asynchronous drain step.
pub type Continuation = Rc<dyn Fn()>;

/// Reconciles the collection property of a widget's state against views
/// managed by a [`Lifecycle`].
pub struct Reconciler<L: Lifecycle> {
    config: GroupConfig,
    lifecycle: L,
    views: Vec<Option<L::View>>,
    pending: BTreeMap<usize, Entry>,
    queue: WorkQueue<usize>,
    in_flight: Rc<Cell<usize>>,
    continuation: Option<Continuation>,
    warned: bool,
}

impl<L: Lifecycle> Reconciler<L> {
    pub fn new(lifecycle: L, config: GroupConfig) -> Self {
        Self {
            config,
            lifecycle,
            views: Vec::new(),
            pending: BTreeMap::new(),
            queue: WorkQueue::new(),
            in_flight: Rc::new(Cell::new(0)),
            continuation: None,
            warned: false,
        }
    }

    /// Start from existing views.
    pub fn with_views(mut self, views: impl IntoIterator<Item = L::View>) -> Self {
        self.views = views.into_iter().map(Some).collect();
        self
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut L {
        &mut self.lifecycle
    }

    /// Live views, skipping slots emptied during an unfinished pass.
    pub fn views(&self) -> impl Iterator<Item = &L::View> {
        self.views.iter().flatten()
    }

    /// View slots, including empty ones.
    pub fn view_slots(&self) -> &[Option<L::View>] {
        &self.views
    }

    /// Number of indices still waiting to be reconciled.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of scheduled continuations that have neither run nor been
    /// dropped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// Install the callback scheduled for asynchronous drain steps. Without
    /// one, asynchronous batches wait for explicit [`drain`](Self::drain)
    /// calls.
    pub fn set_continuation(&mut self, continuation: Continuation) {
        self.continuation = Some(continuation);
    }

    /// Place an entry in the pending map as is, bypassing merge, and queue
    /// its index.
    pub fn enqueue_entry(&mut self, index: usize, entry: Entry) {
        self.pending.insert(index, entry);
        self.queue.add(index);
    }

    fn collection(&self, cx: &Context<'_>) -> ReconcileResult<Value> {
        let path = Path::parse(&self.config.property).map_err(vireo_widget::WidgetError::from)?;
        Ok(cx.state.get_path(&path))
    }

    /// Reduce a structural delta to per-index slots of the collection.
    ///
    /// Slots for `data.N` are taken as they are. Changes deeper inside a row
    /// become a re-derive pair of the current row, unless the row itself has
    /// a slot. A slot for the whole collection expands into one pair per
    /// index whose rows differ.
    pub fn collect_entries(&self, delta: &Delta, data: &Value) -> BTreeMap<usize, Entry> {
        let property = self.config.property.as_str();
        let mut entries = BTreeMap::new();
        let mut rederive = BTreeMap::new();

        for (path, entry) in delta.under(property) {
            if path == property {
                if let Some(change) = entry.as_change() {
                    expand_collection(change, &mut entries);
                }
                continue;
            }
            let rest = &path[property.len() + 1..];
            let (head, nested) = match rest.split_once(PATH_DELIMITER) {
                Some((head, _)) => (head, true),
                None => (rest, false),
            };
            let Ok(index) = head.parse::<usize>() else {
                continue;
            };
            if nested {
                rederive.insert(index, Entry::Pair(Change::rederive(data.index(index))));
            } else {
                entries.insert(index, entry.clone());
            }
        }

        for (index, entry) in rederive {
            entries.entry(index).or_insert(entry);
        }
        entries
    }

    /// Slots for a full pass: every row is created or updated.
    fn full_pass(data: &Value) -> BTreeMap<usize, Entry> {
        rows(data)
            .map(|(index, row)| (index, Entry::pair(Value::Undefined, row)))
            .collect()
    }

    /// Merge index-keyed slots into the pending map and reconcile.
    pub fn render_entries(
        &mut self,
        cx: &Context<'_>,
        entries: BTreeMap<usize, Entry>,
    ) -> ReconcileResult<Rendered> {
        self.pending = merge_maps(&self.pending, &entries);
        self.queue.set(self.pending.keys().copied());
        debug!(
            widget = cx.name,
            incoming = entries.len(),
            pending = self.pending.len(),
            "queue rebuilt"
        );

        if self.config.async_render && self.pending.len() > self.config.large_change {
            if self.config.show_warning && !self.warned {
                self.warned = true;
                warn!(
                    widget = cx.name,
                    pending = self.pending.len(),
                    large_change = self.config.large_change,
                    "large change; rendering asynchronously, the drain method must run for it to finish"
                );
            }
            if self.in_flight.get() == 0 {
                self.schedule(1);
            }
            return Ok(Rendered::Later);
        }

        while let Some(index) = self.queue.get() {
            self.step(cx, index)?;
        }
        self.finish(cx)?;
        Ok(Rendered::Now)
    }

    /// Reconcile the next queued index.
    ///
    /// When that empties the queue the pass is finished and `render` fires;
    /// otherwise `drain_growth` further steps are scheduled.
    pub fn drain(&mut self, cx: &Context<'_>) -> ReconcileResult<Drain> {
        let Some(index) = self.queue.get() else {
            return Ok(Drain::Idle);
        };
        self.step(cx, index)?;

        if self.queue.is_empty() {
            self.finish(cx)?;
            debug!(widget = cx.name, "asynchronous render finished");
            cx.emit(RENDER, Value::Undefined);
            return Ok(Drain::Finished);
        }
        debug!(widget = cx.name, remaining = self.queue.len(), "drain step");
        self.schedule(self.config.drain_growth);
        Ok(Drain::Stepped)
    }

    fn schedule(&self, count: usize) {
        let Some(continuation) = &self.continuation else {
            debug!(count, "no continuation installed; waiting for explicit drain");
            return;
        };
        for _ in 0..count {
            let continuation = Rc::clone(continuation);
            let ticket = InFlight::enter(&self.in_flight);
            self.config.drain_method.schedule(
                Box::new(move || {
                    drop(ticket);
                    continuation();
                }),
                self.config.delay(),
            );
        }
    }

    /// Reconcile a single index.
    fn step(&mut self, cx: &Context<'_>, index: usize) -> ReconcileResult<()> {
        let Some(entry) = self.pending.remove(&index) else {
            return Ok(());
        };
        let kind = entry.kind();
        debug!(widget = cx.name, index, %kind, "reconcile");

        match kind {
            Kind::Nop => {}
            Kind::Create | Kind::Update => {
                let model = self.collection(cx)?.index(index);
                if model.is_undefined() {
                    return Ok(());
                }
                match self.lifecycle.key(&self.config.key, &self.views, &model, index) {
                    Some(position) => {
                        if let Some(view) = self.views.get_mut(position).and_then(Option::as_mut) {
                            self.lifecycle.update(view, &model, index);
                            cx.emit(UPDATE, model);
                        }
                    }
                    None => {
                        if let Some(view) = self.lifecycle.create(&model, index) {
                            let at = index.min(self.views.len());
                            self.views.insert(at, Some(view));
                            cx.emit(CREATE, model);
                        }
                    }
                }
            }
            Kind::Remove => {
                let stale = entry.into_change().map(|c| c.before).unwrap_or_default();
                // Keyed views are matched by identity, not position. A stale
                // row whose id moved to another index still has a model; the
                // sweep at the end of the pass removes the views that lost theirs.
                if let Some(field) = self.config.key.field() {
                    let id = stale.get(field);
                    let data = self.collection(cx)?;
                    if !id.is_undefined() && rows(&data).any(|(_, row)| row.get(field).deep_eq(&id)) {
                        return Ok(());
                    }
                }
                let Some(position) = self.lifecycle.key(&self.config.key, &self.views, &stale, index)
                else {
                    return Ok(());
                };
                let view = if self.config.key.is_positional() {
                    self.views.get_mut(position).and_then(Option::take)
                } else {
                    self.views.remove(position)
                };
                if let Some(view) = view {
                    self.lifecycle.remove(view, index);
                    cx.emit(REMOVE, stale);
                }
            }
            Kind::Unknown => {
                return Err(ReconcileError::UnknownDelta {
                    index,
                    value: entry.to_value(),
                });
            }
        }
        Ok(())
    }

    /// End a pass: drop empty slots, then remove every view that no current
    /// model keys to.
    fn finish(&mut self, cx: &Context<'_>) -> ReconcileResult<()> {
        self.views.retain(Option::is_some);

        let data = self.collection(cx)?;
        let mut kept = vec![false; self.views.len()];
        for (index, model) in rows(&data) {
            if let Some(position) = self.lifecycle.key(&self.config.key, &self.views, &model, index) {
                if let Some(keep) = kept.get_mut(position) {
                    *keep = true;
                }
            }
        }
        if kept.iter().all(|keep| *keep) {
            return Ok(());
        }

        let mut swept = 0;
        for (position, (slot, keep)) in std::mem::take(&mut self.views).into_iter().zip(kept).enumerate() {
            let Some(view) = slot else { continue };
            if keep {
                self.views.push(Some(view));
                continue;
            }
            let identity = match self.config.key.field() {
                Some(field) => self.lifecycle.identity(&view, field),
                None => Value::Undefined,
            };
            self.lifecycle.remove(view, position);
            cx.emit(REMOVE, identity);
            swept += 1;
        }
        debug!(widget = cx.name, swept, "removed views without models");
        Ok(())
    }
}

/// Rows of the collection with their indices.
fn rows(data: &Value) -> impl Iterator<Item = (usize, Value)> {
    data.entries()
        .into_iter()
        .filter_map(|(key, row)| Some((key.parse::<usize>().ok()?, row)))
}

/// One scheduled continuation, counted until it runs or is dropped unrun.
struct InFlight(Rc<Cell<usize>>);

impl InFlight {
    fn enter(counter: &Rc<Cell<usize>>) -> Self {
        counter.set(counter.get() + 1);
        Self(Rc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// One pair per index whose rows differ between the two collections.
fn expand_collection(change: &Change, entries: &mut BTreeMap<usize, Entry>) {
    let len = change.before.len().max(change.after.len());
    for index in 0..len {
        let before = change.before.index(index);
        let after = change.after.index(index);
        if !before.deep_eq(&after) {
            entries.insert(index, Entry::Pair(Change::new(before, after)));
        }
    }
}

impl<L: Lifecycle> Hooks for Reconciler<L> {
    type Error = ReconcileError;

    fn init(&mut self, _cx: &Context<'_>) -> ReconcileResult<()> {
        self.lifecycle.init();
        Ok(())
    }

    fn render(&mut self, cx: &Context<'_>, delta: Option<&Delta>) -> ReconcileResult<Rendered> {
        let data = self.collection(cx)?;
        let entries = match delta {
            Some(delta) => {
                if !delta.paths().any(|p| is_ancestor_or_self(&self.config.property, p)) {
                    return Ok(Rendered::Now);
                }
                self.collect_entries(delta, &data)
            }
            None => Self::full_pass(&data),
        };
        // Pending slots index into the current views, holes included, so
        // views are only re-enumerated between passes.
        if self.queue.is_empty() {
            self.lifecycle.refresh(&mut self.views);
        }
        self.render_entries(cx, entries)
    }
}

impl<L> fmt::Debug for Reconciler<L>
where
    L: Lifecycle + fmt::Debug,
    L::View: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("lifecycle", &self.lifecycle)
            .field("views", &self.views)
            .field("pending", &self.pending)
            .field("queue", &self.queue)
            .field("in_flight", &self.in_flight.get())
            .finish_non_exhaustive()
    }
}
