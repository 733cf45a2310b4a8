use vireo_types::PathError;

/// Errors raised by the widget shell itself.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WidgetError {
    /// A property name could not be parsed as a dotted path.
    #[error("invalid property path: {0}")]
    Path(#[from] PathError),
}

/// Convenience result type for widget operations.
pub type WidgetResult<T> = Result<T, WidgetError>;
