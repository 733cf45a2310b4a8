//! Compound selectors: an optional tag followed by `#id` and `.class` parts.
//!
//! Combinators, attribute selectors and pseudo-classes are not supported.

use std::fmt;
use std::str::FromStr;

use crate::error::{DomError, DomResult};

/// A parsed compound selector such as `li`, `#my-list` or `div.duelist`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    /// A bare tag selector. `tag` is not validated.
    pub fn element(tag: &str) -> Self {
        Selector {
            source: tag.to_string(),
            tag: Some(tag.to_ascii_lowercase()),
            id: None,
            classes: Vec::new(),
        }
    }

    pub fn parse(source: &str) -> DomResult<Self> {
        let invalid = |reason: &str| DomError::Selector {
            selector: source.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty selector"));
        }

        let mut selector = Selector {
            source: trimmed.to_string(),
            tag: None,
            id: None,
            classes: Vec::new(),
        };

        let split = trimmed.find(['#', '.']).unwrap_or(trimmed.len());
        let (tag, mut rest) = trimmed.split_at(split);
        if !tag.is_empty() {
            if !is_ident(tag) {
                return Err(invalid("unsupported tag name"));
            }
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if !is_ident(name) {
                return Err(invalid("expected a name after '#' or '.'"));
            }
            if marker == '#' {
                if selector.id.is_some() {
                    return Err(invalid("more than one id"));
                }
                selector.id = Some(name.to_string());
            } else {
                selector.classes.push(name.to_string());
            }
            rest = &body[end..];
        }

        Ok(selector)
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Whether an element with these properties matches.
    pub fn matches(&self, tag: &str, id: Option<&str>, class_attr: Option<&str>) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if id != Some(expected.as_str()) {
                return false;
            }
        }
        let classes: Vec<&str> = class_attr.unwrap_or("").split_whitespace().collect();
        self.classes.iter().all(|c| classes.contains(&c.as_str()))
    }
}

fn is_ident(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> DomResult<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_parts() {
        let s = Selector::parse("div#main.card.wide").unwrap();
        assert_eq!(s.tag(), Some("div"));
        assert_eq!(s.id(), Some("main"));
        assert_eq!(s.classes(), ["card".to_string(), "wide".to_string()]);
        assert_eq!(s.to_string(), "div#main.card.wide");

        let s: Selector = ".duelist".parse().unwrap();
        assert_eq!(s.tag(), None);
        assert_eq!(s.classes(), ["duelist".to_string()]);
    }

    #[test]
    fn rejects_unsupported_syntax() {
        for bad in ["", "  ", "ul li", "li > a", "#", "a..b", "#a#b", "[href]"] {
            assert!(
                matches!(Selector::parse(bad), Err(DomError::Selector { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn matching() {
        let s = Selector::parse("LI.item").unwrap();
        assert!(s.matches("li", None, Some("item done")));
        assert!(!s.matches("li", None, Some("items")));
        assert!(!s.matches("ul", None, Some("item")));
        assert!(Selector::parse("#x").unwrap().matches("span", Some("x"), None));
        assert!(!Selector::parse("#x").unwrap().matches("span", None, None));
    }
}
