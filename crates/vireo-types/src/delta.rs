//! Structural deltas.
//!
//! A [`Delta`] maps dotted paths to [`Entry`] slots. The normal slot is a
//! `[before, after]` pair ([`Change`]); a pair whose sides are both
//! [`Value::Undefined`] is a cancelled creation, and [`Entry::Settled`] marks
//! a change that has already been effected. Both of those are no-ops.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

/// The `[before, after]` pair recorded for one path.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Change {
    pub before: Value,
    pub after: Value,
}

impl Change {
    pub fn new(before: impl Into<Value>, after: impl Into<Value>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }

    /// A change whose two sides are the same value.
    ///
    /// Used to say "something changed beneath this value; re-derive it".
    pub fn rederive(value: Value) -> Self {
        Self {
            before: value.clone(),
            after: value,
        }
    }

    pub fn is_create(&self) -> bool {
        self.before.is_undefined() && !self.after.is_undefined()
    }

    pub fn is_remove(&self) -> bool {
        !self.before.is_undefined() && self.after.is_undefined()
    }

    pub fn is_update(&self) -> bool {
        !self.before.is_undefined() && !self.after.is_undefined()
    }

    pub fn is_cancelled(&self) -> bool {
        self.before.is_undefined() && self.after.is_undefined()
    }

    pub fn to_value(&self) -> Value {
        Value::array([self.before.clone(), self.after.clone()])
    }
}

/// Shape of a delta slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Create,
    Update,
    Remove,
    Nop,
    /// Neither a pair nor a recognised sentinel.
    Unknown,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Nop => "nop",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// One slot of a [`Delta`].
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// The change has been effected; nothing left to do.
    Settled,
    Pair(Change),
    /// Any other value a caller placed in a delta slot.
    Opaque(Value),
}

impl Entry {
    pub fn pair(before: impl Into<Value>, after: impl Into<Value>) -> Self {
        Entry::Pair(Change::new(before, after))
    }

    /// Decode a raw value into a slot.
    ///
    /// `undefined` is [`Entry::Settled`], a two-item array is a pair, and
    /// anything else is kept as [`Entry::Opaque`].
    pub fn from_value(value: Value) -> Self {
        match &value {
            Value::Undefined => Entry::Settled,
            Value::Array(items) if items.len() == 2 => {
                let items = items.borrow();
                Entry::Pair(Change {
                    before: items[0].clone(),
                    after: items[1].clone(),
                })
            }
            _ => Entry::Opaque(value),
        }
    }

    pub fn as_change(&self) -> Option<&Change> {
        match self {
            Entry::Pair(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_change(self) -> Option<Change> {
        match self {
            Entry::Pair(c) => Some(c),
            _ => None,
        }
    }

    /// Classify the slot for reconciliation.
    pub fn kind(&self) -> Kind {
        match self {
            Entry::Settled => Kind::Nop,
            Entry::Opaque(_) => Kind::Unknown,
            Entry::Pair(c) if c.is_cancelled() => Kind::Nop,
            Entry::Pair(c) if c.is_create() => Kind::Create,
            Entry::Pair(c) if c.is_remove() => Kind::Remove,
            Entry::Pair(_) => Kind::Update,
        }
    }

    /// Returns `true` for slots that merge treats as "no effective change".
    ///
    /// Opaque slots count as no-ops here; only reconciliation rejects them.
    pub fn is_nop(&self) -> bool {
        match self {
            Entry::Settled | Entry::Opaque(_) => true,
            Entry::Pair(c) => c.is_cancelled(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Entry::Settled => Value::Undefined,
            Entry::Pair(c) => c.to_value(),
            Entry::Opaque(v) => v.clone(),
        }
    }
}

impl From<Change> for Entry {
    fn from(change: Change) -> Self {
        Entry::Pair(change)
    }
}

/// Path-keyed collection of delta slots.
///
/// The empty path addresses the root: a diff of two unequal leaves with no
/// prefix is recorded there.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Delta {
    entries: BTreeMap<String, Entry>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// A delta holding a single slot.
    pub fn single(path: impl Into<String>, entry: impl Into<Entry>) -> Self {
        let mut delta = Self::new();
        delta.insert(path, entry);
        delta
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.entries.insert(path.into(), entry.into())
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<Entry> {
        self.entries.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// The root-level change, if the compared values were unequal leaves.
    pub fn root(&self) -> Option<&Change> {
        self.entries.get("").and_then(Entry::as_change)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Slots whose path is `prefix` itself or lies beneath it.
    pub fn under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a Entry)> + 'a {
        self.entries
            .iter()
            .filter(move |(path, _)| crate::path::is_ancestor_or_self(prefix, path))
            .map(|(path, entry)| (path.as_str(), entry))
    }

    /// Wrap into `Some` unless empty.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }

    pub fn as_map(&self) -> &BTreeMap<String, Entry> {
        &self.entries
    }

    pub fn into_inner(self) -> BTreeMap<String, Entry> {
        self.entries
    }

    /// Render as an object of `path -> [before, after]`.
    pub fn to_value(&self) -> Value {
        Value::object(
            self.entries
                .iter()
                .map(|(path, entry)| (path.clone(), entry.to_value())),
        )
    }
}

impl From<BTreeMap<String, Entry>> for Delta {
    fn from(entries: BTreeMap<String, Entry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, Entry)> for Delta {
    fn from_iter<I: IntoIterator<Item = (String, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Delta {
    type Item = (String, Entry);
    type IntoIter = btree_map::IntoIter<String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = (&'a String, &'a Entry);
    type IntoIter = btree_map::Iter<'a, String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(Entry::pair(Value::Undefined, 1).kind(), Kind::Create);
        assert_eq!(Entry::pair(1, Value::Undefined).kind(), Kind::Remove);
        assert_eq!(Entry::pair(1, 2).kind(), Kind::Update);
        assert_eq!(Entry::pair(Value::Undefined, Value::Undefined).kind(), Kind::Nop);
        assert_eq!(Entry::Settled.kind(), Kind::Nop);
        assert_eq!(Entry::Opaque(Value::from(-1)).kind(), Kind::Unknown);
    }

    #[test]
    fn null_is_a_real_value() {
        assert_eq!(Entry::pair(Value::Null, 1).kind(), Kind::Update);
        assert_eq!(Entry::pair(Value::Undefined, Value::Null).kind(), Kind::Create);
    }

    #[test]
    fn rederive_counts_as_update() {
        let row = Value::from(serde_json::json!({"id": 1}));
        assert_eq!(Entry::Pair(Change::rederive(row)).kind(), Kind::Update);
    }

    #[test]
    fn from_value_decodes_slots() {
        assert_eq!(Entry::from_value(Value::Undefined), Entry::Settled);
        assert_eq!(
            Entry::from_value(Value::array([Value::Undefined, Value::from(3)])),
            Entry::pair(Value::Undefined, 3)
        );
        assert!(matches!(Entry::from_value(Value::from(0)), Entry::Opaque(_)));
        assert!(matches!(
            Entry::from_value(Value::array([1, 2, 3])),
            Entry::Opaque(_)
        ));
    }

    #[test]
    fn under_filters_by_segment() {
        let mut delta = Delta::new();
        delta.insert("data.0.x", Entry::pair(1, 2));
        delta.insert("data.1", Entry::pair(Value::Undefined, 3));
        delta.insert("database", Entry::pair(1, 2));
        delta.insert("data", Entry::pair(1, 2));

        let paths: Vec<&str> = delta.under("data").map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["data", "data.0.x", "data.1"]);
    }

    #[test]
    fn root_change_lives_at_empty_path() {
        let delta = Delta::single("", Entry::pair("a", "b"));
        assert_eq!(delta.root(), Some(&Change::new("a", "b")));
        assert!(Delta::single("x", Entry::pair(1, 2)).root().is_none());
    }

    #[test]
    fn to_value_renders_pairs() {
        let delta = Delta::single("x", Entry::pair(1, 2));
        let rendered = delta.to_value();
        assert_eq!(rendered.get("x"), Value::array([1, 2]));
    }
}
