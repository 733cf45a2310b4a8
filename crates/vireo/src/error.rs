use thiserror::Error;

/// Any error raised through the facade.
#[derive(Debug, Error)]
pub enum VireoError {
    #[error("widget error: {0}")]
    Widget(#[from] vireo_widget::WidgetError),

    #[error("reconcile error: {0}")]
    Reconcile(#[from] vireo_reconcile::ReconcileError),

    #[error("config error: {0}")]
    Config(#[from] vireo_reconcile::ConfigError),

    #[error("view target error: {0}")]
    Dom(#[from] vireo_dom::DomError),
}

pub type VireoResult<T> = Result<T, VireoError>;
