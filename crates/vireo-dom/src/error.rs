/// Errors raised by view-target helpers.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// A selector outside the supported `tag`, `#id`, `.class` grammar.
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    /// A setter rule other than `text` or `attr:<name>`.
    #[error("unknown setter rule: {0}")]
    UnknownRule(String),
}

/// Convenience result type for view-target helpers.
pub type DomResult<T> = Result<T, DomError>;
