use ghost_core_types::GhostErrorKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum IpcError {
    #[error("envelope header invalid: {0}")]
    InvalidHeader(String),
    #[error("payload invalid for {operation}: {detail}")]
    InvalidPayload { operation: &'static str, detail: String },
}

impl IpcError {
    pub fn kind(&self) -> GhostErrorKind {
        GhostErrorKind::Validation
    }
}
