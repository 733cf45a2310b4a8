use vireo_types::Value;
use vireo_widget::WidgetError;

/// Errors raised while reconciling a collection.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A pending entry is neither a pair nor a no-op. The delta stream that
    /// produced it is corrupt; the entry has already been consumed.
    #[error("unrecognized delta entry at index {index}: {value:?}")]
    UnknownDelta { index: usize, value: Value },

    #[error(transparent)]
    Widget(#[from] WidgetError),
}

/// Errors raised while loading a [`GroupConfig`](crate::GroupConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid group configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid collection property: {0}")]
    Property(#[from] vireo_types::PathError),
}

/// Convenience result type for reconciliation.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
