//! Dotted property paths.
//!
//! A path such as `data.0.name` is a sequence of segments separated by `.`.
//! Segments that parse as unsigned integers address array items; everything
//! else is an object key. Reads never fail; writes create whatever containers
//! are missing along the way.

use std::fmt;

use crate::error::PathError;
use crate::value::{Array, Object, Value};

/// Separator between path segments.
pub const PATH_DELIMITER: char = '.';

/// One hop of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(i) => Segment::Index(i),
            Err(_) => Segment::Key(raw.to_string()),
        }
    }

    /// The segment as an object key.
    pub fn as_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A parsed, non-empty dotted path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Parse a dotted path.
    ///
    /// # Examples
    ///
    /// ```
    /// use vireo_types::{Path, Segment};
    ///
    /// let path = Path::parse("data.0.name").unwrap();
    /// assert_eq!(path.segments()[1], Segment::Index(0));
    /// assert!(Path::parse("").is_err());
    /// assert!(Path::parse("a..b").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for (position, part) in raw.split(PATH_DELIMITER).enumerate() {
            if part.is_empty() {
                return Err(PathError::EmptySegment {
                    path: raw.to_string(),
                    position,
                });
            }
            segments.push(Segment::parse(part));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn first(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; parsed paths have at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_DELIMITER}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

/// Join a prefix and a key with the path delimiter.
///
/// An empty prefix yields the bare key.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{PATH_DELIMITER}{key}")
    }
}

/// Returns `true` if `ancestor` is `path` itself or one of its parents.
///
/// The comparison is segment-aware: `a.1` is not an ancestor of `a.10`.
/// The empty path is the ancestor of everything.
pub fn is_ancestor_or_self(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() || ancestor == path {
        return true;
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with(PATH_DELIMITER))
}

impl Value {
    /// Read the value at `path`; missing hops read as [`Value::Undefined`].
    pub fn get_path(&self, path: &Path) -> Value {
        let mut current = self.clone();
        for segment in path.segments() {
            current = match segment {
                Segment::Key(k) => current.get(k),
                Segment::Index(i) => current.index(*i),
            };
            if current.is_undefined() {
                break;
            }
        }
        current
    }

    /// Write `value` at `path`, creating intermediate containers.
    ///
    /// Missing or scalar intermediates are replaced by an array when the next
    /// segment is an index and by an object otherwise. Writing past the end
    /// of an array pads it with [`Value::Undefined`]. The root itself must be
    /// a composite; writing into a leaf root is a no-op and returns `false`.
    pub fn set_path(&self, path: &Path, value: Value) -> bool {
        let segments = path.segments();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return false,
        };
        if !self.is_composite() {
            return false;
        }

        let mut current = self.clone();
        for (depth, segment) in parents.iter().enumerate() {
            let existing = read_slot(&current, segment);
            let next = if existing.is_composite() {
                existing
            } else {
                let fresh = match segments[depth + 1] {
                    Segment::Index(_) => Value::Array(Array::default()),
                    Segment::Key(_) => Value::Object(Object::default()),
                };
                write_slot(&current, segment, fresh.clone());
                fresh
            };
            current = next;
        }
        write_slot(&current, last, value);
        true
    }
}

fn read_slot(container: &Value, segment: &Segment) -> Value {
    match (container, segment) {
        (Value::Array(a), Segment::Index(i)) => a.get(*i),
        (Value::Array(_), Segment::Key(_)) => Value::Undefined,
        (Value::Object(o), segment) => o.get(&segment.as_key()),
        _ => Value::Undefined,
    }
}

fn write_slot(container: &Value, segment: &Segment, value: Value) {
    match (container, segment) {
        (Value::Array(a), Segment::Index(i)) => {
            let mut items = a.borrow_mut();
            if *i >= items.len() {
                items.resize(*i + 1, Value::Undefined);
            }
            items[*i] = value;
        }
        // Named properties on arrays are not representable; ignore them.
        (Value::Array(_), Segment::Key(_)) => {}
        (Value::Object(o), segment) => {
            o.insert(segment.as_key(), value);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    #[test]
    fn parse_mixed_segments() {
        let path = p("stats.items.3.label");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("stats".into()),
                Segment::Key("items".into()),
                Segment::Index(3),
                Segment::Key("label".into()),
            ]
        );
        assert_eq!(path.to_string(), "stats.items.3.label");
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert_eq!(Path::parse(""), Err(PathError::Empty));
        assert!(matches!(
            Path::parse(".a"),
            Err(PathError::EmptySegment { position: 0, .. })
        ));
        assert!(matches!(
            Path::parse("a."),
            Err(PathError::EmptySegment { position: 1, .. })
        ));
    }

    #[test]
    fn get_path_walks_objects_and_arrays() {
        let root = Value::from(json!({"data": [{"id": 1}, {"id": 2}]}));
        assert_eq!(root.get_path(&p("data.1.id")), Value::from(2));
        assert!(root.get_path(&p("data.7.id")).is_undefined());
        assert!(root.get_path(&p("data.0.id.deeper")).is_undefined());
    }

    #[test]
    fn set_path_creates_intermediates() {
        let root = Value::empty_object();
        assert!(root.set_path(&p("stats.count"), Value::from(42)));
        assert_eq!(root, Value::from(json!({"stats": {"count": 42}})));

        assert!(root.set_path(&p("rows.1.name"), Value::from("b")));
        let rows = root.get("rows");
        assert_eq!(rows.len(), 2);
        assert!(rows.index(0).is_undefined());
        assert_eq!(rows.index(1).get("name"), Value::from("b"));
    }

    #[test]
    fn set_path_replaces_scalar_intermediates() {
        let root = Value::from(json!({"a": 5}));
        root.set_path(&p("a.b"), Value::from(true));
        assert_eq!(root, Value::from(json!({"a": {"b": true}})));
    }

    #[test]
    fn set_path_on_leaf_root_is_noop() {
        assert!(!Value::from(1).set_path(&p("a"), Value::Null));
    }

    #[test]
    fn ancestor_test_is_segment_aware() {
        assert!(is_ancestor_or_self("a.1", "a.1"));
        assert!(is_ancestor_or_self("a.1", "a.1.x"));
        assert!(!is_ancestor_or_self("a.1", "a.10"));
        assert!(is_ancestor_or_self("", "anything"));
    }

    #[test]
    fn join_handles_root_prefix() {
        assert_eq!(join("", "x"), "x");
        assert_eq!(join("a.b", "x"), "a.b.x");
    }
}
