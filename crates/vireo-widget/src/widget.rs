//! The widget lifecycle shell.
//!
//! A [`Widget`] owns a state object, an [`Emitter`], and a [`Hooks`]
//! implementation that turns state changes into effects. Properties are
//! assigned by dotted path with [`Widget::set`], which computes a delta for
//! every property that actually changed and hands the merged delta to
//! [`Hooks::render`].

use tracing::debug;
use vireo_diff::{diff_at, summarize};
use vireo_merge::merge;
use vireo_types::{Delta, Path, Value};

use crate::error::WidgetError;
use crate::events::{Emitter, Event, SubscriptionId, CHANGE, INIT, RENDER};

/// What a render hook did with the delta it was given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rendered {
    /// The view reflects the state; the widget emits `render`.
    Now,
    /// Work was deferred; the hook emits `render` itself once done.
    Later,
}

/// When [`Widget::set_with`] calls the render hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Render only if some property changed.
    #[default]
    IfChanged,
    /// Always render, even without changes.
    Always,
    /// Assign properties without rendering.
    Never,
}

/// Read access to a widget's state and events, handed to its hooks.
pub struct Context<'a> {
    pub state: &'a Value,
    pub events: &'a Emitter,
    pub name: &'a str,
}

impl Context<'_> {
    /// Fire an event with this widget as the target.
    pub fn emit(&self, kind: &str, data: Value) -> usize {
        self.events.trigger(kind, self.name, data)
    }
}

/// Behaviour plugged into a [`Widget`].
pub trait Hooks {
    /// Error type of the hooks. Widget errors convert into it.
    type Error: From<WidgetError>;

    /// Called once, after the initial properties are assigned.
    fn init(&mut self, _cx: &Context<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Make the view reflect the state.
    ///
    /// `delta` is `None` for a full render (construction, forced renders
    /// without changes) and the merged per-property delta otherwise.
    fn render(&mut self, _cx: &Context<'_>, _delta: Option<&Delta>) -> Result<Rendered, Self::Error> {
        Ok(Rendered::Now)
    }
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Plain;

impl Hooks for Plain {
    type Error = WidgetError;
}

/// An object that re-renders when its state changes.
#[derive(Debug)]
pub struct Widget<H> {
    name: String,
    state: Value,
    events: Emitter,
    hooks: H,
}

impl<H: Hooks> Widget<H> {
    /// Build a widget: assign `props` without rendering, run `init`, emit
    /// `init`, then render once with no delta.
    pub fn new<I, K, V>(name: impl Into<String>, props: I, hooks: H) -> Result<Self, H::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Self::with_emitter(name, props, hooks, Emitter::new())
    }

    /// Like [`Widget::new`], but with subscribers already attached so that
    /// they observe `init` and the first `render`.
    pub fn with_emitter<I, K, V>(
        name: impl Into<String>,
        props: I,
        hooks: H,
        events: Emitter,
    ) -> Result<Self, H::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut widget = Self {
            name: name.into(),
            state: Value::empty_object(),
            events,
            hooks,
        };
        widget.set_with(props, RenderMode::Never)?;
        widget.drive(|hooks, cx| {
            hooks.init(cx)?;
            cx.emit(INIT, Value::Undefined);
            Ok::<(), H::Error>(())
        })?;
        widget.render()?;
        Ok(widget)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The state object. Containers are shared: mutating them bypasses
    /// change detection.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Read a property by dotted path.
    pub fn get(&self, path: &str) -> Result<Value, WidgetError> {
        Ok(self.state.get_path(&Path::parse(path)?))
    }

    pub fn events(&self) -> &Emitter {
        &self.events
    }

    /// Subscribe to the comma-separated `events`.
    pub fn on(&self, events: &str, handler: impl Fn(&Event) + 'static) -> SubscriptionId {
        self.events.on(events, handler)
    }

    pub fn off(&self, events: &str, id: SubscriptionId) -> bool {
        self.events.off(events, id)
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Run `f` with the hooks and a context, for work that happens outside
    /// `set`, such as deferred rendering steps.
    pub fn drive<R>(&mut self, f: impl FnOnce(&mut H, &Context<'_>) -> R) -> R {
        let cx = Context {
            state: &self.state,
            events: &self.events,
            name: &self.name,
        };
        f(&mut self.hooks, &cx)
    }

    /// Assign properties, rendering if any of them changed.
    ///
    /// Returns `true` if the render hook ran.
    pub fn set<I, K, V>(&mut self, props: I) -> Result<bool, H::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.set_with(props, RenderMode::IfChanged)
    }

    /// Assign properties under an explicit [`RenderMode`].
    pub fn set_with<I, K, V>(&mut self, props: I, mode: RenderMode) -> Result<bool, H::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut delta: Option<Delta> = None;
        let mut changed = false;
        for (key, value) in props {
            let key = key.as_ref();
            let path = Path::parse(key).map_err(WidgetError::from)?;
            let value = value.into();
            let current = self.state.get_path(&path);
            if current.deep_eq(&value) {
                continue;
            }
            changed = true;
            let change = diff_at(key, &current, &value);
            delta = merge(delta.as_ref(), change.as_ref());
            self.state.set_path(&path, value);
        }

        let render = match mode {
            RenderMode::Always => true,
            RenderMode::Never => false,
            RenderMode::IfChanged => changed,
        };
        debug!(widget = %self.name, changed, render, "properties assigned");
        if !render {
            return Ok(false);
        }

        if let Some(delta) = &delta {
            let summary = summarize(delta);
            debug!(
                widget = %self.name,
                creates = summary.creates,
                updates = summary.updates,
                removes = summary.removes,
                "change"
            );
            self.events.trigger(CHANGE, &self.name, delta.to_value());
        }
        self.render_delta(delta.as_ref())?;
        Ok(true)
    }

    /// Render the whole state, with no delta.
    ///
    /// `set` also renders without a delta when properties changed but the
    /// changes cancelled out or had no leaf-level difference.
    pub fn render(&mut self) -> Result<Rendered, H::Error> {
        self.render_delta(None)
    }

    fn render_delta(&mut self, delta: Option<&Delta>) -> Result<Rendered, H::Error> {
        let cx = Context {
            state: &self.state,
            events: &self.events,
            name: &self.name,
        };
        let rendered = self.hooks.render(&cx, delta)?;
        if rendered == Rendered::Now {
            cx.emit(RENDER, Value::Undefined);
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WILDCARD;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    /// Mirrors `model` into `view` on every render.
    #[derive(Default)]
    struct Mirror {
        renders: Vec<Option<Delta>>,
        inits: usize,
    }

    impl Hooks for Mirror {
        type Error = WidgetError;

        fn init(&mut self, cx: &Context<'_>) -> Result<(), WidgetError> {
            self.inits += 1;
            cx.state.set_path(&Path::parse("value")?, Value::from(42));
            Ok(())
        }

        fn render(&mut self, cx: &Context<'_>, delta: Option<&Delta>) -> Result<Rendered, WidgetError> {
            self.renders.push(delta.cloned());
            let view = if cx.state.get("model") == Value::from(0) {
                "zero"
            } else {
                "non-zero"
            };
            cx.state.set_path(&Path::parse("view")?, Value::from(view));
            Ok(Rendered::Now)
        }
    }

    #[test]
    fn empty_widget() {
        let widget = Widget::new("w", Vec::<(&str, Value)>::new(), Plain).unwrap();
        assert!(widget.get("name").unwrap().is_undefined());
        assert_eq!(widget.name(), "w");
    }

    #[test]
    fn constructor_assigns_then_inits_then_renders() {
        let widget = Widget::new("w", [("model", 0)], Mirror::default()).unwrap();
        assert_eq!(widget.get("model").unwrap(), Value::from(0));
        assert_eq!(widget.get("value").unwrap(), Value::from(42));
        assert_eq!(widget.get("view").unwrap(), Value::from("zero"));
        assert_eq!(widget.hooks().inits, 1);
        assert_eq!(widget.hooks().renders, vec![None]);
    }

    #[test]
    fn set_renders_only_on_change() {
        let mut widget = Widget::new("w", [("model", 0)], Mirror::default()).unwrap();

        assert!(!widget.set([("model", 0)]).unwrap());
        assert!(widget.set([("model", 1)]).unwrap());
        assert_eq!(widget.get("view").unwrap(), Value::from("non-zero"));

        let last = widget.hooks().renders.last().cloned().flatten().unwrap();
        assert_eq!(last, Delta::single("model", vireo_types::Entry::pair(0, 1)));
    }

    #[test]
    fn dotted_paths_create_intermediates() {
        let mut widget = Widget::new("w", [("stats.count", 42)], Plain).unwrap();
        assert_eq!(widget.state().get("stats"), v(json!({"count": 42})));

        let next = widget.get("stats.count").unwrap().as_f64().unwrap() + 1.0;
        widget.set([("stats.count", next)]).unwrap();
        assert_eq!(widget.get("stats.count").unwrap(), Value::from(43));
    }

    #[test]
    fn render_modes() {
        let mut widget = Widget::new("w", [("model", 0)], Mirror::default()).unwrap();

        assert!(widget.set_with([("model", 0)], RenderMode::Always).unwrap());
        assert_eq!(widget.hooks().renders.last(), Some(&None));

        assert!(!widget.set_with([("model", 5)], RenderMode::Never).unwrap());
        assert_eq!(widget.get("model").unwrap(), Value::from(5));
        assert_eq!(widget.get("view").unwrap(), Value::from("zero"));
        assert_eq!(widget.hooks().renders.len(), 2);
    }

    #[test]
    fn merged_delta_covers_every_changed_property() {
        let mut widget = Widget::new("w", [("a", 1), ("b", 2)], Mirror::default()).unwrap();
        widget.set([("a", 10), ("b", 2), ("c", 3)]).unwrap();

        let delta = widget.hooks().renders.last().cloned().flatten().unwrap();
        assert_eq!(delta.paths().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn change_delta_tallies_by_kind() {
        let mut widget = Widget::new("w", [("a", 1), ("b", 2)], Mirror::default()).unwrap();
        widget
            .set([("a", Value::from(10)), ("b", Value::Undefined), ("c", Value::from(3))])
            .unwrap();

        let delta = widget.hooks().renders.last().cloned().flatten().unwrap();
        let summary = summarize(&delta);
        assert_eq!((summary.creates, summary.updates, summary.removes), (1, 1, 1));
        assert_eq!(summary.effective(), delta.len());
    }

    #[test]
    fn nested_values_produce_nested_paths() {
        let mut widget =
            Widget::new("w", [("data", v(json!([{"x": 1}, {"x": 2}])))], Mirror::default()).unwrap();
        widget.set([("data", v(json!([{"x": 1}, {"x": 3}])))]).unwrap();

        let delta = widget.hooks().renders.last().cloned().flatten().unwrap();
        assert_eq!(delta.paths().collect::<Vec<_>>(), vec!["data.1.x"]);
    }

    #[test]
    fn events_fire_in_lifecycle_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let events = Emitter::new();
        events.on(WILDCARD, move |e| sink.borrow_mut().push(e.kind.clone()));

        let mut widget = Widget::with_emitter("w", [("model", 0)], Mirror::default(), events).unwrap();
        widget.set([("model", 1)]).unwrap();
        widget.set([("model", 1)]).unwrap();

        assert_eq!(*log.borrow(), vec!["init", "render", "change", "render"]);
    }

    #[test]
    fn change_event_carries_pairs() {
        let mut widget = Widget::new("w", [("model", 0)], Plain).unwrap();
        let seen = Rc::new(RefCell::new(Value::Undefined));
        let sink = Rc::clone(&seen);
        widget.on("change", move |e| *sink.borrow_mut() = e.data.clone());

        widget.set([("model", 1)]).unwrap();
        assert_eq!(seen.borrow().get("model"), Value::array([0, 1]));
    }

    #[test]
    fn deferred_render_does_not_emit() {
        struct Deferred;
        impl Hooks for Deferred {
            type Error = WidgetError;
            fn render(&mut self, _: &Context<'_>, _: Option<&Delta>) -> Result<Rendered, WidgetError> {
                Ok(Rendered::Later)
            }
        }

        let events = Emitter::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        events.on("render", move |_| *sink.borrow_mut() += 1);

        let mut widget = Widget::with_emitter("w", [("a", 1)], Deferred, events).unwrap();
        widget.set([("a", 2)]).unwrap();
        assert_eq!(*count.borrow(), 0);

        widget.drive(|_, cx| cx.emit(RENDER, Value::Undefined));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let mut widget = Widget::new("w", Vec::<(&str, Value)>::new(), Plain).unwrap();
        assert!(matches!(widget.set([("a..b", 1)]), Err(WidgetError::Path(_))));
        assert!(widget.get("").is_err());
    }
}
