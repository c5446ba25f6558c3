use ghost_core_types::GhostErrorKind;
use std::fmt;

/// A driver-level failure. Always carries enough context for the loop and
/// scheduler to classify it without inspecting the message string.
#[derive(Debug, Clone)]
pub struct DriverError {
    pub kind: GhostErrorKind,
    pub message: String,
    pub url: Option<String>,
    pub status: Option<u16>,
    pub step: Option<u32>,
    pub retryable: bool,
}

impl DriverError {
    pub fn new(kind: GhostErrorKind, message: impl Into<String>) -> Self {
        let retryable = kind.is_retriable();
        Self {
            kind,
            message: message.into(),
            url: None,
            status: None,
            step: None,
            retryable,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GhostErrorKind::Network, message)
    }

    pub fn cdp(message: impl Into<String>) -> Self {
        Self::new(GhostErrorKind::Cdp, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GhostErrorKind::Timeout, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(GhostErrorKind::Runtime, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        let mut err = Self::new(GhostErrorKind::Validation, message);
        err.retryable = false;
        err
    }

    pub fn kind(&self) -> GhostErrorKind {
        self.kind
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(url) = &self.url {
            write!(f, " (url={})", url)?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}
