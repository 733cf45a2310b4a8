//! The list lifecycle: models rendered as clones of a template element.

use std::fmt;
use std::rc::Rc;

use tracing::debug;
use vireo_reconcile::{KeyPolicy, Lifecycle};
use vireo_types::Value;

use crate::error::DomResult;
use crate::selector::Selector;
use crate::target::ViewTarget;

/// Writes a model into its element.
pub type Populate<T> = Rc<dyn Fn(&T, &Value, usize)>;

/// Renders each model as a copy of a template element inside a container.
///
/// Unless a template is supplied, [`init`](Lifecycle::init) takes the first
/// element matching the selector out of the container and uses it. By default
/// an element shows its model's display text; [`with_populate`] replaces that.
///
/// [`with_populate`]: ListViews::with_populate
#[derive(Clone)]
pub struct ListViews<T> {
    container: Option<T>,
    template: Option<T>,
    selector: Selector,
    populate: Populate<T>,
}

impl<T: ViewTarget + 'static> ListViews<T> {
    pub fn new(container: T) -> Self {
        Self {
            container: Some(container),
            ..Self::detached()
        }
    }

    /// A list with no container. It creates no views.
    pub fn detached() -> Self {
        Self {
            container: None,
            template: None,
            selector: Selector::element("li"),
            populate: Rc::new(|view: &T, model: &Value, _: usize| view.set_text(&model.display_text())),
        }
    }

    /// Select rendered items with `selector` instead of `li`.
    pub fn with_selector(mut self, selector: &str) -> DomResult<Self> {
        self.selector = Selector::parse(selector)?;
        Ok(self)
    }

    pub fn with_template(mut self, template: T) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_populate(mut self, populate: impl Fn(&T, &Value, usize) + 'static) -> Self {
        self.populate = Rc::new(populate);
        self
    }
}

impl<T> ListViews<T> {
    pub fn container(&self) -> Option<&T> {
        self.container.as_ref()
    }

    pub fn template(&self) -> Option<&T> {
        self.template.as_ref()
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl<T: ViewTarget> Lifecycle for ListViews<T> {
    type View = T;

    fn init(&mut self) {
        if self.template.is_some() {
            return;
        }
        let Some(container) = &self.container else {
            return;
        };
        self.template = container.find(&self.selector);
        match &self.template {
            Some(template) => {
                template.detach();
            }
            None => debug!(selector = %self.selector, "no template in container"),
        }
    }

    /// By-id keying compares the identity attribute with the display text
    /// of the model's id, since attributes are strings.
    fn key(&self, policy: &KeyPolicy, views: &[Option<T>], model: &Value, index: usize) -> Option<usize> {
        match policy {
            KeyPolicy::ByIndex => views.get(index)?.as_ref().map(|_| index),
            KeyPolicy::ById { field } => {
                let id = model.get(field);
                if id.is_undefined() {
                    return None;
                }
                let id = id.display_text();
                views.iter().position(|slot| {
                    slot.as_ref()
                        .is_some_and(|view| view.attr(field).as_deref() == Some(id.as_str()))
                })
            }
        }
    }

    fn identity(&self, view: &T, field: &str) -> Value {
        view.attr(field).map(Value::from).unwrap_or_default()
    }

    fn create(&mut self, model: &Value, index: usize) -> Option<T> {
        let (Some(container), Some(template)) = (&self.container, &self.template) else {
            return None;
        };
        let view = template.clone_node();
        (self.populate)(&view, model, index);
        container.append(&view);
        Some(view)
    }

    fn update(&mut self, view: &mut T, model: &Value, index: usize) {
        (self.populate)(view, model, index);
    }

    fn remove(&mut self, view: T, _index: usize) {
        view.detach();
    }

    fn refresh(&mut self, views: &mut Vec<Option<T>>) {
        if let Some(container) = &self.container {
            *views = container.find_all(&self.selector).into_iter().map(Some).collect();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ListViews<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListViews")
            .field("container", &self.container)
            .field("template", &self.template)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
