//! Counts of slot kinds in a delta.

use vireo_types::{Delta, Kind};

/// Per-kind tally of a [`Delta`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeltaSummary {
    pub creates: usize,
    pub updates: usize,
    pub removes: usize,
    pub nops: usize,
    pub unknown: usize,
}

impl DeltaSummary {
    /// Total number of slots that will cause work when reconciled.
    pub fn effective(&self) -> usize {
        self.creates + self.updates + self.removes
    }

    pub fn is_empty(&self) -> bool {
        self.effective() == 0 && self.unknown == 0
    }
}

/// Tally the slots of `delta` by kind.
pub fn summarize(delta: &Delta) -> DeltaSummary {
    let mut summary = DeltaSummary::default();
    for (_, entry) in delta {
        match entry.kind() {
            Kind::Create => summary.creates += 1,
            Kind::Update => summary.updates += 1,
            Kind::Remove => summary.removes += 1,
            Kind::Nop => summary.nops += 1,
            Kind::Unknown => summary.unknown += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff;
    use serde_json::json;
    use vireo_types::{Entry, Value};

    #[test]
    fn counts_each_kind() {
        let before = Value::from(json!({"a": 1, "b": 2}));
        let after = Value::from(json!({"b": 3, "c": 4}));
        let summary = summarize(&diff(&before, &after).unwrap());
        assert_eq!(
            summary,
            DeltaSummary {
                creates: 1,
                updates: 1,
                removes: 1,
                nops: 0,
                unknown: 0,
            }
        );
        assert_eq!(summary.effective(), 3);
    }

    #[test]
    fn settled_and_opaque_slots() {
        let mut delta = Delta::new();
        delta.insert("x", Entry::Settled);
        delta.insert("y", Entry::Opaque(Value::from(0)));
        let summary = summarize(&delta);
        assert_eq!(summary.nops, 1);
        assert_eq!(summary.unknown, 1);
        assert!(!summary.is_empty());
    }
}
