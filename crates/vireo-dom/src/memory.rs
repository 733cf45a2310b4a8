//! In-memory element tree.
//!
//! [`Node`] is a reference-counted element with a tag, attributes, text and
//! children. It implements [`ViewTarget`] and is the target used when no
//! real rendering backend is attached.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::selector::Selector;
use crate::target::ViewTarget;

struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<Node>,
    parent: Weak<RefCell<NodeData>>,
}

/// Handle to an element. Clones share the element; use
/// [`clone_node`](ViewTarget::clone_node) for a copy.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    pub fn new(tag: &str) -> Self {
        Node(Rc::new(RefCell::new(NodeData {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_id(self, id: &str) -> Self {
        self.with_attr("id", id)
    }

    pub fn with_class(self, class: &str) -> Self {
        self.with_attr("class", class)
    }

    pub fn with_text(self, text: &str) -> Self {
        self.0.borrow_mut().text = text.to_string();
        self
    }

    pub fn with_child(self, child: Node) -> Self {
        self.append(&child);
        self
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        let data = self.0.borrow();
        selector.matches(
            &data.tag,
            data.attrs.get("id").map(String::as_str),
            data.attrs.get("class").map(String::as_str),
        )
    }

    /// Whether `self` is `other` or one of its ancestors.
    fn contains(&self, other: &Node) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if node.ptr_eq(self) {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    fn collect(&self, selector: &Selector, out: &mut Vec<Node>, first_only: bool) {
        for child in self.children() {
            if first_only && !out.is_empty() {
                return;
            }
            if child.matches(selector) {
                out.push(child.clone());
            }
            child.collect(selector, out, first_only);
        }
    }

    /// Serialize as markup, for assertions and logs.
    pub fn to_html(&self) -> String {
        let data = self.0.borrow();
        let mut html = format!("<{}", data.tag);
        for (name, value) in &data.attrs {
            html.push_str(&format!(" {name}=\"{value}\""));
        }
        html.push('>');
        html.push_str(&data.text);
        for child in &data.children {
            html.push_str(&child.to_html());
        }
        html.push_str(&format!("</{}>", data.tag));
        html
    }
}

impl ViewTarget for Node {
    fn find(&self, selector: &Selector) -> Option<Self> {
        let mut out = Vec::new();
        self.collect(selector, &mut out, true);
        out.into_iter().next()
    }

    fn find_all(&self, selector: &Selector) -> Vec<Self> {
        let mut out = Vec::new();
        self.collect(selector, &mut out, false);
        out
    }

    fn clone_node(&self) -> Self {
        let data = self.0.borrow();
        let copy = Node::new(&data.tag);
        {
            let mut target = copy.0.borrow_mut();
            target.attrs = data.attrs.clone();
            target.text = data.text.clone();
        }
        for child in &data.children {
            copy.append(&child.clone_node());
        }
        copy
    }

    fn append(&self, child: &Self) {
        if child.contains(self) {
            warn!(parent = %self.tag(), child = %child.tag(), "refusing to append an ancestor");
            return;
        }
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
    }

    fn set_text(&self, text: &str) {
        let children = {
            let mut data = self.0.borrow_mut();
            data.text = text.to_string();
            std::mem::take(&mut data.children)
        };
        for child in children {
            child.0.borrow_mut().parent = Weak::new();
        }
    }

    fn text(&self) -> String {
        let data = self.0.borrow();
        let mut text = data.text.clone();
        for child in &data.children {
            text.push_str(&child.text());
        }
        text
    }

    fn set_attr(&self, name: &str, value: &str) {
        self.0
            .borrow_mut()
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.0.borrow().attrs.get(name).cloned()
    }

    fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        parent.0.borrow_mut().children.retain(|c| !c.ptr_eq(self));
        self.0.borrow_mut().parent = Weak::new();
        true
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
