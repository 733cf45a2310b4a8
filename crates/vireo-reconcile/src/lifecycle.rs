//! View lifecycle strategies.
//!
//! A [`Lifecycle`] knows how to correlate models with views and how to
//! create, update and dispose of views. The reconciler decides *when* each
//! of these happens; the lifecycle decides *what* they do.

use serde::{Deserialize, Serialize};
use vireo_types::Value;

/// How a model finds its view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum KeyPolicy {
    /// The view at the same position as the model.
    #[default]
    ByIndex,
    /// The first view whose identity field equals the model's.
    ById { field: String },
}

impl KeyPolicy {
    /// Keying by the conventional `id` field.
    pub fn by_id() -> Self {
        KeyPolicy::ById {
            field: "id".to_string(),
        }
    }

    /// Whether removed views leave holes to be compacted after a pass.
    pub fn is_positional(&self) -> bool {
        matches!(self, KeyPolicy::ByIndex)
    }

    /// The identity field, for keyed policies.
    pub fn field(&self) -> Option<&str> {
        match self {
            KeyPolicy::ByIndex => None,
            KeyPolicy::ById { field } => Some(field),
        }
    }
}

/// Creates, updates and disposes of the views backing a collection.
///
/// Views are stored in slots; an empty slot is a view removed during the
/// current pass under positional keying.
pub trait Lifecycle {
    type View;

    /// One-time setup, run when the owning widget initializes.
    fn init(&mut self) {}

    /// Position of the view that belongs to `model`, or `None` if it has
    /// none and must be created.
    fn key(
        &self,
        policy: &KeyPolicy,
        views: &[Option<Self::View>],
        model: &Value,
        index: usize,
    ) -> Option<usize> {
        match policy {
            KeyPolicy::ByIndex => views.get(index)?.as_ref().map(|_| index),
            KeyPolicy::ById { field } => {
                let id = model.get(field);
                if id.is_undefined() {
                    return None;
                }
                views.iter().position(|slot| {
                    slot.as_ref()
                        .is_some_and(|view| self.identity(view, field).deep_eq(&id))
                })
            }
        }
    }

    /// The value of `field` on a view, used by [`KeyPolicy::ById`].
    fn identity(&self, view: &Self::View, field: &str) -> Value;

    /// Build a view for `model`. `None` means no view can be made (for
    /// example, no template is available); the model is then skipped.
    fn create(&mut self, model: &Value, index: usize) -> Option<Self::View>;

    /// Bring `view` in line with `model`.
    fn update(&mut self, view: &mut Self::View, model: &Value, index: usize);

    /// Dispose of a view whose model is gone.
    fn remove(&mut self, _view: Self::View, _index: usize) {}

    /// Re-enumerate the live views before a full reconciliation pass, for
    /// targets whose views can change outside the reconciler.
    fn refresh(&mut self, _views: &mut Vec<Option<Self::View>>) {}
}

/// Views that are plain objects.
///
/// `update` copies the model's properties onto the view; a model that is not
/// an object replaces the view outright.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectViews;

impl Lifecycle for ObjectViews {
    type View = Value;

    fn identity(&self, view: &Value, field: &str) -> Value {
        view.get(field)
    }

    fn create(&mut self, model: &Value, index: usize) -> Option<Value> {
        let mut view = Value::empty_object();
        self.update(&mut view, model, index);
        Some(view)
    }

    fn update(&mut self, view: &mut Value, model: &Value, _index: usize) {
        if let (Some(target), Some(source)) = (view.as_object(), model.as_object()) {
            if !target.ptr_eq(source) {
                for (key, value) in source.borrow().iter() {
                    target.insert(key.clone(), value.clone());
                }
            }
            return;
        }
        *view = model.clone();
    }
}
