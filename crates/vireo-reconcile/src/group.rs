//! Shared handle over a reconciling widget.
//!
//! Asynchronous drain steps run from the scheduler, long after the `set` call
//! that queued them has returned, so the widget lives behind
//! `Rc<RefCell<..>>` and every scheduled continuation holds a weak reference
//! to it. A continuation whose group has been dropped does nothing.
//!
//! Events raised while the widget is borrowed are held and delivered once
//! the borrow ends, so handlers may read or update the group they observe.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};
use vireo_types::{Entry, Value};
use vireo_widget::{Emitter, Event, RenderMode, SubscriptionId, Widget};

use crate::config::GroupConfig;
use crate::error::ReconcileResult;
use crate::lifecycle::Lifecycle;
use crate::reconciler::{Continuation, Drain, Reconciler};

type Shared<L> = Rc<RefCell<Widget<Reconciler<L>>>>;
type Slot<L> = Rc<RefCell<Weak<RefCell<Widget<Reconciler<L>>>>>>;

/// A widget whose render hook reconciles a model array against views.
pub struct Group<L: Lifecycle> {
    inner: Shared<L>,
    events: Emitter,
}

impl<L: Lifecycle> Clone for Group<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            events: self.events.clone(),
        }
    }
}

impl<L: Lifecycle + 'static> Group<L> {
    /// Build a group with no views.
    pub fn new<I, K, V>(
        name: impl Into<String>,
        props: I,
        lifecycle: L,
        config: GroupConfig,
    ) -> ReconcileResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Self::from_reconciler(name, props, Reconciler::new(lifecycle, config), Emitter::new())
    }

    /// Build a group around a prepared reconciler. `events` may already have
    /// subscribers, which then observe `init` and the first render.
    pub fn from_reconciler<I, K, V>(
        name: impl Into<String>,
        props: I,
        mut reconciler: Reconciler<L>,
        events: Emitter,
    ) -> ReconcileResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let slot: Slot<L> = Rc::new(RefCell::new(Weak::new()));
        reconciler.set_continuation(continuation(Rc::clone(&slot), events.clone()));

        let handle = events.clone();
        let widget = Widget::with_emitter(name, props, reconciler, events)?;
        let inner = Rc::new(RefCell::new(widget));
        *slot.borrow_mut() = Rc::downgrade(&inner);
        Ok(Self {
            inner,
            events: handle,
        })
    }

    /// Run `f` on the widget, delivering the events it raises afterwards.
    fn held<R>(&self, f: impl FnOnce(&mut Widget<Reconciler<L>>) -> R) -> R {
        self.events.hold();
        let result = f(&mut self.inner.borrow_mut());
        self.events.release();
        result
    }

    /// Assign properties; reconcile if the collection changed.
    pub fn set<I, K, V>(&self, props: I) -> ReconcileResult<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.held(|widget| widget.set(props))
    }

    pub fn set_with<I, K, V>(&self, props: I, mode: RenderMode) -> ReconcileResult<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.held(|widget| widget.set_with(props, mode))
    }

    /// Reconcile the next queued index now.
    pub fn drain(&self) -> ReconcileResult<Drain> {
        self.held(|widget| widget.drive(|reconciler, cx| reconciler.drain(cx)))
    }

    /// Queue an index-keyed entry without merging it.
    pub fn enqueue_entry(&self, index: usize, entry: Entry) {
        self.inner
            .borrow_mut()
            .hooks_mut()
            .enqueue_entry(index, entry);
    }

    /// Read a property by dotted path; invalid paths read as undefined.
    pub fn get(&self, path: &str) -> Value {
        self.inner.borrow().get(path).unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name().to_string()
    }

    pub fn on(&self, events: &str, handler: impl Fn(&Event) + 'static) -> SubscriptionId {
        self.events.on(events, handler)
    }

    pub fn off(&self, events: &str, id: SubscriptionId) -> bool {
        self.events.off(events, id)
    }

    pub fn pending_len(&self) -> usize {
        self.inner.borrow().hooks().pending_len()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.borrow().hooks().in_flight()
    }

    /// Run `f` with the reconciler.
    pub fn with_reconciler<R>(&self, f: impl FnOnce(&Reconciler<L>) -> R) -> R {
        f(self.inner.borrow().hooks())
    }

    /// Run `f` with the reconciler mutably, e.g. to reach the lifecycle.
    pub fn with_reconciler_mut<R>(&self, f: impl FnOnce(&mut Reconciler<L>) -> R) -> R {
        self.held(|widget| f(widget.hooks_mut()))
    }
}

impl<L> Group<L>
where
    L: Lifecycle + 'static,
    L::View: Clone,
{
    /// Live views, in order.
    pub fn views(&self) -> Vec<L::View> {
        self.inner.borrow().hooks().views().cloned().collect()
    }

    /// View slots, including ones emptied by an unfinished pass.
    pub fn view_slots(&self) -> Vec<Option<L::View>> {
        self.inner.borrow().hooks().view_slots().to_vec()
    }
}

fn continuation<L: Lifecycle + 'static>(slot: Slot<L>, events: Emitter) -> Continuation {
    Rc::new(move || {
        let Some(widget) = slot.borrow().upgrade() else {
            debug!("group dropped; continuation skipped");
            return;
        };
        events.hold();
        let outcome = widget.try_borrow_mut().map(|mut widget| {
            let name = widget.name().to_string();
            widget
                .drive(|reconciler, cx| reconciler.drain(cx))
                .map_err(|err| (name, err))
        });
        events.release();

        match outcome {
            // The queue is left intact; the next render or drain resumes it.
            Err(_) => warn!("group busy; continuation skipped"),
            Ok(Err((name, err))) => error!(widget = %name, error = %err, "asynchronous drain failed"),
            Ok(Ok(_)) => {}
        }
    })
}
