//! Tagged dynamic values.
//!
//! Arrays and objects are shared, interior-mutable containers: cloning a
//! [`Value`] clones the reference, not the contents. Two values holding the
//! same container are identical in the sense of [`Value::same`], which is the
//! fast path the diff engine takes before any structural comparison.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Property map backing an [`Object`].
pub type Map = BTreeMap<String, Value>;

/// Opaque handle to an externally rendered element.
///
/// Elements are leaves: they are compared by id and never descended into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el:{}", self.0)
    }
}

/// Shared ordered sequence.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Item at `index`, or [`Value::Undefined`] when out of range.
    pub fn get(&self, index: usize) -> Value {
        self.0.borrow().get(index).cloned().unwrap_or_default()
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Returns `true` if both handles point at the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared container, stable for its lifetime.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// Shared key-value container.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Map>>);

impl Object {
    pub fn new(map: Map) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    pub fn borrow(&self) -> Ref<'_, Map> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Map> {
        self.0.borrow_mut()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Property `key`, or [`Value::Undefined`] when absent.
    pub fn get(&self, key: &str) -> Value {
        self.0.borrow().get(key).cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    /// Snapshot of the property names in iteration order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value: a missing key, an out-of-range index, or an unset slot.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    /// Regular expression, kept as its pattern source.
    Regex(String),
    Element(ElementId),
    Array(Array),
    Object(Object),
}

impl Value {
    /// Build an array value from any sequence of convertible items.
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(Array::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an object value from key-value pairs.
    pub fn object<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Value::Object(Object::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn empty_object() -> Self {
        Value::Object(Object::default())
    }

    pub fn empty_array() -> Self {
        Value::Array(Array::default())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Arrays and objects are composites; everything else is a leaf.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_composite()
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Regex(_) => "regexp",
            Value::Element(_) => "element",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Child addressed by a single path segment.
    ///
    /// Objects are looked up by key; arrays accept decimal indices. Anything
    /// else reads as [`Value::Undefined`].
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(o) => o.get(key),
            Value::Array(a) => key.parse::<usize>().map(|i| a.get(i)).unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Array item at `index`, or [`Value::Undefined`].
    pub fn index(&self, index: usize) -> Value {
        match self {
            Value::Array(a) => a.get(index),
            Value::Object(o) => o.get(&index.to_string()),
            _ => Value::Undefined,
        }
    }

    /// Number of items or properties; zero for leaves.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(a) => a.len(),
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Own entries of a composite as `(key, value)` pairs; empty for leaves.
    ///
    /// Array keys are the decimal indices.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match self {
            Value::Array(a) => a
                .borrow()
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            Value::Object(o) => o
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` when both values are the same reference (composites) or
    /// the same primitive.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Number(a), Value::Number(b)) => a == b,
            (a, b) if a.is_leaf() && b.is_leaf() => a.deep_eq(b),
            _ => false,
        }
    }

    /// Container address for composites.
    pub fn addr(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.addr()),
            Value::Object(o) => Some(o.addr()),
            _ => None,
        }
    }

    /// Structural equality. `NaN` equals `NaN`; cycles terminate.
    pub fn deep_eq(&self, other: &Value) -> bool {
        let mut stack = Vec::new();
        deep_eq_inner(self, other, &mut stack)
    }

    /// Copy of this value with fresh containers all the way down.
    ///
    /// Back-references inside cyclic graphs are copied as [`Value::Undefined`].
    pub fn deep_clone(&self) -> Value {
        let mut stack = Vec::new();
        deep_clone_inner(self, &mut stack)
    }

    /// Text used when a value is rendered as element content.
    pub fn display_text(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Date(d) => d.to_rfc3339(),
            Value::Regex(r) => format!("/{r}/"),
            Value::Element(id) => id.to_string(),
            Value::Array(_) | Value::Object(_) => self.to_json().to_string(),
        }
    }

    /// Lossy conversion to JSON. Undefined properties are dropped, undefined
    /// array items become `null`, back-references become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut stack = Vec::new();
        to_json_inner(self, &mut stack)
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn deep_eq_inner(a: &Value, b: &Value, stack: &mut Vec<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::Regex(x), Value::Regex(y)) => x == y,
        (Value::Element(x), Value::Element(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            if x.ptr_eq(y) {
                return true;
            }
            let pair = (x.addr(), y.addr());
            if stack.contains(&pair) {
                return true;
            }
            let (xs, ys) = (x.borrow(), y.borrow());
            if xs.len() != ys.len() {
                return false;
            }
            stack.push(pair);
            let eq = xs
                .iter()
                .zip(ys.iter())
                .all(|(l, r)| deep_eq_inner(l, r, stack));
            stack.pop();
            eq
        }
        (Value::Object(x), Value::Object(y)) => {
            if x.ptr_eq(y) {
                return true;
            }
            let pair = (x.addr(), y.addr());
            if stack.contains(&pair) {
                return true;
            }
            let (xs, ys) = (x.borrow(), y.borrow());
            if xs.len() != ys.len() {
                return false;
            }
            stack.push(pair);
            let eq = xs.iter().all(|(k, l)| match ys.get(k) {
                Some(r) => deep_eq_inner(l, r, stack),
                None => false,
            });
            stack.pop();
            eq
        }
        _ => false,
    }
}

fn deep_clone_inner(value: &Value, stack: &mut Vec<usize>) -> Value {
    let Some(addr) = value.addr() else {
        return value.clone();
    };
    if stack.contains(&addr) {
        return Value::Undefined;
    }
    stack.push(addr);
    let copy = match value {
        Value::Array(a) => Value::Array(Array::new(
            a.borrow().iter().map(|v| deep_clone_inner(v, stack)).collect(),
        )),
        Value::Object(o) => Value::Object(Object::new(
            o.borrow()
                .iter()
                .map(|(k, v)| (k.clone(), deep_clone_inner(v, stack)))
                .collect(),
        )),
        other => other.clone(),
    };
    stack.pop();
    copy
}

fn to_json_inner(value: &Value, stack: &mut Vec<usize>) -> serde_json::Value {
    use serde_json::Value as Json;

    if let Some(addr) = value.addr() {
        if stack.contains(&addr) {
            return Json::Null;
        }
        stack.push(addr);
    }
    let json = match value {
        Value::Undefined | Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(d.to_rfc3339()),
        Value::Regex(r) => Json::String(r.clone()),
        Value::Element(id) => Json::from(id.0),
        Value::Array(a) => Json::Array(a.borrow().iter().map(|v| to_json_inner(v, stack)).collect()),
        Value::Object(o) => Json::Object(
            o.borrow()
                .iter()
                .filter(|(_, v)| !v.is_undefined())
                .map(|(k, v)| (k.clone(), to_json_inner(v, stack)))
                .collect(),
        ),
    };
    if value.is_composite() {
        stack.pop();
    }
    json
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.deep_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = Vec::new();
        debug_inner(self, f, &mut stack)
    }
}

fn debug_inner(value: &Value, f: &mut fmt::Formatter<'_>, stack: &mut Vec<usize>) -> fmt::Result {
    match value {
        Value::Undefined => f.write_str("undefined"),
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Number(n) => f.write_str(&format_number(*n)),
        Value::String(s) => write!(f, "{s:?}"),
        Value::Date(d) => write!(f, "Date({})", d.to_rfc3339()),
        Value::Regex(r) => write!(f, "/{r}/"),
        Value::Element(id) => write!(f, "<{id}>"),
        Value::Array(a) => {
            if stack.contains(&a.addr()) {
                return f.write_str("[Circular]");
            }
            stack.push(a.addr());
            f.write_str("[")?;
            for (i, item) in a.borrow().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                debug_inner(item, f, stack)?;
            }
            stack.pop();
            f.write_str("]")
        }
        Value::Object(o) => {
            if stack.contains(&o.addr()) {
                return f.write_str("[Circular]");
            }
            stack.push(o.addr());
            f.write_str("{")?;
            for (i, (key, item)) in o.borrow().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key}: ")?;
                debug_inner(item, f, stack)?;
            }
            stack.pop();
            f.write_str("}")
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<ElementId> for Value {
    fn from(id: ElementId) -> Self {
        Value::Element(id)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(Object::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_default()
    }
}

impl TryFrom<Value> for Array {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(a) => Ok(a),
            other => Err(TypeError::UnexpectedKind {
                expected: "array",
                actual: other.kind_name(),
            }),
        }
    }
}

impl TryFrom<Value> for Object {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(o) => Ok(o),
            other => Err(TypeError::UnexpectedKind {
                expected: "object",
                actual: other.kind_name(),
            }),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items),
            Json::Object(map) => Value::object(map),
        }
    }
}
