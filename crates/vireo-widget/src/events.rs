//! Named observation events.
//!
//! Subscribers register per event name, or under [`WILDCARD`] to receive every
//! event. Several names can be registered in one call by separating them with
//! commas. When an event fires, the subscribers of that name run first and
//! the wildcard subscribers after them, each group in registration order.
//!
//! While an emitter is [held](Emitter::hold), events are queued instead and
//! delivered, in order, when the last hold is released. Owners that fire
//! events while borrowed use this so handlers can reach back into them.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use vireo_types::Value;

/// Subscription name that receives every event.
pub const WILDCARD: &str = "*";

pub const INIT: &str = "init";
pub const RENDER: &str = "render";
pub const CHANGE: &str = "change";
pub const CREATE: &str = "create";
pub const UPDATE: &str = "update";
pub const REMOVE: &str = "remove";

/// An observation delivered to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event name, e.g. `render`.
    pub kind: String,
    /// Name of the widget that fired the event.
    pub target: String,
    pub data: Value,
}

/// Identifies one `on` registration, across all the names it covered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&Event)>;

/// Event emitter with wildcard and multi-name registration.
///
/// All methods take `&self`; handlers may subscribe or unsubscribe while an
/// event is being delivered. Such changes apply from the next `trigger`.
/// Clones share subscribers and held events.
#[derive(Clone, Default)]
pub struct Emitter {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: Cell<u64>,
    subscribers: RefCell<BTreeMap<String, Vec<(SubscriptionId, Handler)>>>,
    holds: Cell<usize>,
    held: RefCell<VecDeque<Event>>,
}

fn names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty())
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every name in the comma-separated `events`.
    pub fn on(&self, events: &str, handler: impl Fn(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let handler: Handler = Rc::new(handler);
        let mut subscribers = self.inner.subscribers.borrow_mut();
        for name in names(events) {
            subscribers
                .entry(name.to_string())
                .or_default()
                .push((id, Rc::clone(&handler)));
        }
        id
    }

    /// Remove the registration `id` from the named events.
    ///
    /// Returns `true` if anything was removed; removing twice is harmless.
    pub fn off(&self, events: &str, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let mut removed = false;
        for name in names(events) {
            if let Some(list) = subscribers.get_mut(name) {
                let before = list.len();
                list.retain(|(sub, _)| *sub != id);
                removed |= list.len() != before;
            }
        }
        removed
    }

    /// Remove every subscriber of the named events.
    pub fn off_all(&self, events: &str) {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        for name in names(events) {
            subscribers.remove(name);
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.subscribers.borrow().get(event).map_or(0, Vec::len)
    }

    /// Deliver an event to its subscribers, then to wildcard subscribers.
    ///
    /// Returns the number of handlers invoked, which is zero while the
    /// emitter is held.
    pub fn trigger(&self, kind: &str, target: &str, data: Value) -> usize {
        let event = Event {
            kind: kind.to_string(),
            target: target.to_string(),
            data,
        };
        if self.is_held() {
            self.inner.held.borrow_mut().push_back(event);
            return 0;
        }
        self.deliver(&event)
    }

    /// Queue events instead of delivering them. Holds nest.
    pub fn hold(&self) {
        self.inner.holds.set(self.inner.holds.get() + 1);
    }

    /// End one hold. Ending the last one delivers the queued events in the
    /// order they were raised, including any raised by their handlers.
    ///
    /// Returns the number of handlers invoked.
    pub fn release(&self) -> usize {
        let holds = self.inner.holds.get().saturating_sub(1);
        self.inner.holds.set(holds);
        if holds > 0 {
            return 0;
        }
        let mut invoked = 0;
        loop {
            let next = self.inner.held.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            invoked += self.deliver(&event);
        }
        invoked
    }

    pub fn is_held(&self) -> bool {
        self.inner.holds.get() > 0
    }

    fn deliver(&self, event: &Event) -> usize {
        let kind = event.kind.as_str();
        let handlers: Vec<Handler> = {
            let subscribers = self.inner.subscribers.borrow();
            let named = subscribers.get(kind).into_iter().flatten();
            let wildcard = if kind == WILDCARD {
                None
            } else {
                subscribers.get(WILDCARD)
            };
            named
                .chain(wildcard.into_iter().flatten())
                .map(|(_, handler)| Rc::clone(handler))
                .collect()
        };
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.inner.subscribers.borrow();
        let counts: BTreeMap<&str, usize> = subscribers
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("Emitter")
            .field("subscribers", &counts)
            .field("held", &self.inner.held.borrow().len())
            .finish()
    }
}
