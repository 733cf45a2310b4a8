use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    #[error("expected {expected}, got {actual}")]
    UnexpectedKind {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors produced while parsing a dotted property path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path must not be empty")]
    Empty,

    #[error("empty segment at position {position} in {path:?}")]
    EmptySegment { path: String, position: usize },
}
