//! Idempotent element writes.

use crate::error::{DomError, DomResult};
use crate::target::ViewTarget;

enum Rule<'a> {
    Text,
    Attr(&'a str),
}

impl<'a> Rule<'a> {
    fn parse(raw: &'a str) -> DomResult<Self> {
        match raw.split_once(':') {
            None if raw == "text" => Ok(Rule::Text),
            Some(("attr", name)) if !name.is_empty() => Ok(Rule::Attr(name)),
            _ => Err(DomError::UnknownRule(raw.to_string())),
        }
    }
}

/// Apply `(rule, value)` pairs to `target`, writing only values that differ
/// from what the element already holds.
///
/// Rules are `text` and `attr:<name>`. Every rule is parsed before anything
/// is written, so an unknown rule leaves the element untouched. Returns the
/// number of writes performed.
pub fn set_if_changed<T: ViewTarget>(target: &T, rules: &[(&str, &str)]) -> DomResult<usize> {
    let parsed = rules
        .iter()
        .map(|(rule, value)| Rule::parse(rule).map(|rule| (rule, *value)))
        .collect::<DomResult<Vec<_>>>()?;

    let mut writes = 0;
    for (rule, value) in parsed {
        match rule {
            Rule::Text => {
                if target.text() != value {
                    target.set_text(value);
                    writes += 1;
                }
            }
            Rule::Attr(name) => {
                if target.attr(name).as_deref() != Some(value) {
                    target.set_attr(name, value);
                    writes += 1;
                }
            }
        }
    }
    Ok(writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Node;

    #[test]
    fn writes_only_changed_values() {
        let a = Node::new("a").with_text("Aaron Burr");
        let rules = [("text", "Aaron Burr"), ("attr:href", "mailto:aaron.burr@example.com")];
        assert_eq!(set_if_changed(&a, &rules).unwrap(), 1);
        assert_eq!(set_if_changed(&a, &rules).unwrap(), 0);
        assert_eq!(a.attr("href").as_deref(), Some("mailto:aaron.burr@example.com"));

        assert_eq!(set_if_changed(&a, &[("text", "Alexander Hamilton")]).unwrap(), 1);
        assert_eq!(a.text(), "Alexander Hamilton");
    }

    #[test]
    fn unknown_rules_write_nothing() {
        let a = Node::new("a");
        let err = set_if_changed(&a, &[("text", "x"), ("css:color", "red")]).unwrap_err();
        assert_eq!(err, DomError::UnknownRule("css:color".into()));
        assert_eq!(a.text(), "");
        assert!(set_if_changed(&a, &[("attr:", "x")]).is_err());
        assert!(set_if_changed(&a, &[("html", "x")]).is_err());
    }
}
