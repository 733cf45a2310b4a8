//! Per-slot composition rules.
//!
//! A slot is either *normal* (a pair that creates, updates or removes) or a
//! *no-op* (settled, cancelled, opaque, or simply absent). The rules are:
//!
//! | first  | second | result                |
//! |--------|--------|-----------------------|
//! | no-op  | no-op  | absent                |
//! | no-op  | normal | second                |
//! | normal | no-op  | first                 |
//! | normal | normal | `[first.0, second.1]` |
//!
//! A composed pair of two equal leaves is itself a no change and is dropped.

use std::collections::BTreeMap;

use tracing::trace;
use vireo_types::{Change, Delta, Entry};

fn is_nop(entry: Option<&Entry>) -> bool {
    entry.map_or(true, Entry::is_nop)
}

/// Compose one slot of a delta with the slot that followed it.
pub fn merge_entry(first: Option<&Entry>, second: Option<&Entry>) -> Option<Entry> {
    match (first, second) {
        (a, b) if is_nop(a) && is_nop(b) => None,
        (a, b) if is_nop(a) => b.cloned(),
        (a, b) if is_nop(b) => a.cloned(),
        (Some(Entry::Pair(a)), Some(Entry::Pair(b))) => {
            let combined = Change::new(a.before.clone(), b.after.clone());
            if combined.before.is_leaf()
                && combined.after.is_leaf()
                && combined.before.deep_eq(&combined.after)
            {
                None
            } else {
                Some(Entry::Pair(combined))
            }
        }
        // Every non-pair slot is a no-op, so the guards above cover it.
        _ => None,
    }
}

/// Compose two keyed slot maps. Keys of `first` keep their position; keys
/// only in `second` are carried through when they are not no-ops.
pub fn merge_maps<K: Ord + Clone>(
    first: &BTreeMap<K, Entry>,
    second: &BTreeMap<K, Entry>,
) -> BTreeMap<K, Entry> {
    let mut result = BTreeMap::new();
    for (key, entry) in first {
        if let Some(merged) = merge_entry(Some(entry), second.get(key)) {
            result.insert(key.clone(), merged);
        }
    }
    for (key, entry) in second {
        if !first.contains_key(key) && !entry.is_nop() {
            result.insert(key.clone(), entry.clone());
        }
    }
    result
}

/// Compose `first` followed by `second` into a single delta.
///
/// Returns `None` when nothing effective remains.
pub fn merge(first: Option<&Delta>, second: Option<&Delta>) -> Option<Delta> {
    let empty = BTreeMap::new();
    let left = first.map_or(&empty, Delta::as_map);
    let right = second.map_or(&empty, Delta::as_map);
    let merged = merge_maps(left, right);
    trace!(
        first = left.len(),
        second = right.len(),
        merged = merged.len(),
        "merged deltas"
    );
    Delta::from(merged).non_empty()
}
