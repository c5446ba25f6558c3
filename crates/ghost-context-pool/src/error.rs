use ghost_core_types::GhostErrorKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
    #[error("context pool misconfigured: {0}")]
    Misconfigured(String),
    #[error("context pool is shutting down")]
    Closed,
}

impl PoolError {
    pub fn kind(&self) -> GhostErrorKind {
        match self {
            PoolError::Misconfigured(_) => GhostErrorKind::Validation,
            PoolError::Closed => GhostErrorKind::State,
        }
    }
}
