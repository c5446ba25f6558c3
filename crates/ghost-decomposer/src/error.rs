use ghost_core_types::GhostErrorKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecomposerError {
    #[error("planner failed to produce a decomposition: {0}")]
    PlanningFailed(String),
    #[error("subtask {index} failed verification: {reason}")]
    VerificationFailed { index: usize, reason: String },
    #[error("subtask {index} loop failed: {reason}")]
    SubtaskLoopFailed { index: usize, reason: String },
}

impl DecomposerError {
    pub fn kind(&self) -> GhostErrorKind {
        match self {
            DecomposerError::PlanningFailed(_) => GhostErrorKind::Runtime,
            DecomposerError::VerificationFailed { .. } => GhostErrorKind::Validation,
            DecomposerError::SubtaskLoopFailed { .. } => GhostErrorKind::Runtime,
        }
    }
}
