//! The view-target seam.
//!
//! The list lifecycle only needs a handful of element primitives. They are
//! collected in [`ViewTarget`] so that raw elements and wrapped selections
//! (see [`Handle`]) can be used interchangeably.

use crate::selector::Selector;

/// Element primitives used to build and maintain rendered views.
///
/// Implementors are cheap handles: cloning one refers to the same element.
pub trait ViewTarget: Clone {
    /// First descendant matching `selector`, in document order.
    fn find(&self, selector: &Selector) -> Option<Self>;

    /// Every descendant matching `selector`, in document order.
    fn find_all(&self, selector: &Selector) -> Vec<Self>;

    /// Deep copy, detached from any parent.
    fn clone_node(&self) -> Self;

    /// Move `child` to the end of this element's children.
    fn append(&self, child: &Self);

    /// Replace the element's content with `text`.
    fn set_text(&self, text: &str);

    fn text(&self) -> String;

    fn set_attr(&self, name: &str, value: &str);

    fn attr(&self, name: &str) -> Option<String>;

    /// Remove the element from its parent. Returns `false` if it had none.
    fn detach(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// An ordered collection of elements handled as one, in the manner of a
/// wrapped query result.
#[derive(Clone, Debug, Default)]
pub struct Selection<E> {
    elements: Vec<E>,
}

impl<E> Selection<E> {
    pub fn new(elements: Vec<E>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first(&self) -> Option<&E> {
        self.elements.first()
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.elements.iter()
    }

    pub fn into_inner(self) -> Vec<E> {
        self.elements
    }
}

impl<E> FromIterator<E> for Selection<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Either a raw element or a wrapped selection of elements.
///
/// Every [`ViewTarget`] operation dispatches on the variant. On a selection,
/// mutations apply to each element, reads use the first element (text is
/// concatenated), and `append` targets the first element.
#[derive(Clone, Debug)]
pub enum Handle<E> {
    Raw(E),
    Wrapped(Selection<E>),
}

impl<E> Handle<E> {
    pub fn wrap(elements: Vec<E>) -> Self {
        Handle::Wrapped(Selection::new(elements))
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Handle::Wrapped(_))
    }

    /// The element single-element operations act on.
    pub fn element(&self) -> Option<&E> {
        match self {
            Handle::Raw(element) => Some(element),
            Handle::Wrapped(selection) => selection.first(),
        }
    }

    pub fn elements(&self) -> Vec<&E> {
        match self {
            Handle::Raw(element) => vec![element],
            Handle::Wrapped(selection) => selection.iter().collect(),
        }
    }
}

impl<E> From<E> for Handle<E> {
    fn from(element: E) -> Self {
        Handle::Raw(element)
    }
}

impl<E: ViewTarget> ViewTarget for Handle<E> {
    fn find(&self, selector: &Selector) -> Option<Self> {
        match self {
            Handle::Raw(element) => element.find(selector).map(Handle::Raw),
            Handle::Wrapped(selection) => selection
                .iter()
                .find_map(|element| element.find(selector))
                .map(|found| Handle::wrap(vec![found])),
        }
    }

    fn find_all(&self, selector: &Selector) -> Vec<Self> {
        match self {
            Handle::Raw(element) => element.find_all(selector).into_iter().map(Handle::Raw).collect(),
            Handle::Wrapped(selection) => selection
                .iter()
                .flat_map(|element| element.find_all(selector))
                .map(|found| Handle::wrap(vec![found]))
                .collect(),
        }
    }

    fn clone_node(&self) -> Self {
        match self {
            Handle::Raw(element) => Handle::Raw(element.clone_node()),
            Handle::Wrapped(selection) => {
                Handle::Wrapped(selection.iter().map(ViewTarget::clone_node).collect())
            }
        }
    }

    fn append(&self, child: &Self) {
        let Some(parent) = self.element() else {
            return;
        };
        for element in child.elements() {
            parent.append(element);
        }
    }

    fn set_text(&self, text: &str) {
        for element in self.elements() {
            element.set_text(text);
        }
    }

    fn text(&self) -> String {
        self.elements().iter().map(|element| element.text()).collect()
    }

    fn set_attr(&self, name: &str, value: &str) {
        for element in self.elements() {
            element.set_attr(name, value);
        }
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.element()?.attr(name)
    }

    fn detach(&self) -> bool {
        self.elements()
            .into_iter()
            .fold(false, |detached, element| element.detach() || detached)
    }
}
