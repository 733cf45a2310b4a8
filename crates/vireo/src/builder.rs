use tracing::debug;
use vireo_dom::{ListViews, ViewTarget};
use vireo_reconcile::{Group, GroupConfig, Reconciler};
use vireo_types::Value;
use vireo_widget::{Emitter, Event};

use crate::error::VireoResult;

/// A group rendering its models into elements.
pub type List<T> = Group<ListViews<T>>;

/// Builder for a [`List`].
///
/// Subscriptions registered with [`on`](ListBuilder::on) are in place before
/// the list initializes, so they observe `init` and the first render.
pub struct ListBuilder<T> {
    name: String,
    views: ListViews<T>,
    config: GroupConfig,
    events: Emitter,
}

impl<T: ViewTarget + 'static> ListBuilder<T> {
    pub fn new(name: impl Into<String>, container: T) -> Self {
        Self {
            name: name.into(),
            views: ListViews::new(container),
            config: GroupConfig::default(),
            events: Emitter::new(),
        }
    }

    /// Match rendered items with `selector` (default `li`).
    pub fn selector(mut self, selector: &str) -> VireoResult<Self> {
        self.views = self.views.with_selector(selector)?;
        Ok(self)
    }

    /// Use `template` instead of extracting one from the container.
    pub fn template(mut self, template: T) -> Self {
        self.views = self.views.with_template(template);
        self
    }

    pub fn populate(mut self, populate: impl Fn(&T, &Value, usize) + 'static) -> Self {
        self.views = self.views.with_populate(populate);
        self
    }

    pub fn config(mut self, config: GroupConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the configuration with one parsed from TOML, keeping the
    /// current drain method.
    pub fn config_toml(mut self, source: &str) -> VireoResult<Self> {
        let drain_method = self.config.drain_method.clone();
        self.config = GroupConfig::from_toml_str(source)?;
        self.config.drain_method = drain_method;
        Ok(self)
    }

    pub fn on(self, events: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.events.on(events, handler);
        self
    }

    /// Initialize the list with `props` and run its first render.
    pub fn build<I, K, V>(self, props: I) -> VireoResult<List<T>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        debug!(
            list = %self.name,
            selector = %self.views.selector(),
            property = %self.config.property,
            "building list"
        );
        let reconciler = Reconciler::new(self.views, self.config);
        Ok(Group::from_reconciler(self.name, props, reconciler, self.events)?)
    }
}
