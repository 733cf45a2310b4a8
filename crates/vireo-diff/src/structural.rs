//! Structural diff: compare two value graphs and produce a path-keyed delta.
//!
//! Composites are walked key by key (array indices are keys). Keys of the
//! `before` side are visited first, then keys that exist only on the `after`
//! side. Leaves are compared with deep equality and recorded as
//! `[before, after]` pairs under their dotted path.

use std::collections::{HashMap, HashSet};

use vireo_types::{is_ancestor_or_self, join, Change, Delta, Value};

/// Compute the delta between `before` and `after`.
///
/// Returns `None` when there is no observable difference. A root-level leaf
/// change is recorded under the empty path (see [`Delta::root`]).
pub fn diff(before: &Value, after: &Value) -> Option<Delta> {
    diff_at("", before, after)
}

/// Compute the delta between `before` and `after`, prefixing every path with
/// `prefix`.
///
/// When the root comparison itself is a leaf-level change, the result is a
/// single slot keyed by `prefix`.
pub fn diff_at(prefix: &str, before: &Value, after: &Value) -> Option<Delta> {
    let mut walker = Walker::default();
    walker.mark(before, after, prefix);
    match walker.step(before, after, prefix) {
        Some(change) => Some(Delta::single(prefix, change)),
        None => walker.result.non_empty(),
    }
}

/// How a composite key pair should be handled by the cycle guard.
enum Guard {
    Descend,
    /// Both sides point back at the same relative ancestor.
    Unchanged,
    /// The sides disagree about a back-reference; record them as a pair.
    Replace,
}

#[derive(Default)]
struct Walker {
    result: Delta,
    checked: HashSet<String>,
    seen_before: HashMap<usize, String>,
    seen_after: HashMap<usize, String>,
}

impl Walker {
    fn step(&mut self, before: &Value, after: &Value, prefix: &str) -> Option<Change> {
        if before.same(after) {
            return None;
        }
        if before.is_leaf() || after.is_leaf() {
            return if before.deep_eq(after) {
                None
            } else {
                Some(Change::new(before.clone(), after.clone()))
            };
        }

        for (key, left) in before.entries() {
            let path = join(prefix, &key);
            let right = after.get(&key);
            self.checked.insert(path.clone());

            if left.same(&right) {
                continue;
            }
            match self.guard(&left, &right, &path) {
                Guard::Unchanged => continue,
                Guard::Replace => {
                    self.result.insert(path, Change::new(left, right));
                }
                Guard::Descend => {
                    if let Some(change) = self.step(&left, &right, &path) {
                        self.result.insert(path, change);
                    }
                }
            }
        }

        for (key, right) in after.entries() {
            let path = join(prefix, &key);
            if !self.checked.insert(path.clone()) {
                continue;
            }
            // Keys only on the `after` side compare against `undefined`, which
            // is a leaf, so this never recurses.
            if let Some(change) = self.step(&Value::Undefined, &right, &path) {
                self.result.insert(path, change);
            }
        }

        None
    }

    fn guard(&mut self, before: &Value, after: &Value, path: &str) -> Guard {
        let back_before = back_reference(&self.seen_before, before, path);
        let back_after = back_reference(&self.seen_after, after, path);
        match (back_before, back_after) {
            (None, None) => {
                self.mark(before, after, path);
                Guard::Descend
            }
            (Some(a), Some(b)) if a == b => Guard::Unchanged,
            _ => Guard::Replace,
        }
    }

    fn mark(&mut self, before: &Value, after: &Value, path: &str) {
        if let Some(addr) = before.addr() {
            self.seen_before.insert(addr, path.to_string());
        }
        if let Some(addr) = after.addr() {
            self.seen_after.insert(addr, path.to_string());
        }
    }
}

/// First-seen path of `value` if it is an ancestor of `path`.
fn back_reference(seen: &HashMap<usize, String>, value: &Value, path: &str) -> Option<String> {
    let addr = value.addr()?;
    let first = seen.get(&addr)?;
    is_ancestor_or_self(first, path).then(|| first.clone())
}
