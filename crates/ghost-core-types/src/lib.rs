//! Shared identifiers, value types, and the error taxonomy used across the
//! Ghost Tabs crates.

#[cfg(feature = "serde-full")]
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde-full", derive(Serialize, Deserialize))]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_type!(TaskId, "task");
id_type!(ContextId, "ctx");
id_type!(SubtaskId, "subtask");
id_type!(MessageId, "msg");

/// Taxonomy of failure categories shared by every crate's error type.
///
/// Each crate-local `thiserror` enum carries a `kind() -> GhostErrorKind`
/// accessor so the scheduler's retry policy and the IPC envelope can reason
/// about failures without downcasting concrete error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-full", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum GhostErrorKind {
    Network,
    Runtime,
    Cdp,
    Timeout,
    Validation,
    State,
    Unknown,
}

impl GhostErrorKind {
    /// Whether the scheduler should consider retrying a step that failed
    /// with this kind of error.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            GhostErrorKind::Network | GhostErrorKind::Cdp | GhostErrorKind::Timeout
        )
    }
}

impl fmt::Display for GhostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GhostErrorKind::Network => "NETWORK",
            GhostErrorKind::Runtime => "RUNTIME",
            GhostErrorKind::Cdp => "CDP",
            GhostErrorKind::Timeout => "TIMEOUT",
            GhostErrorKind::Validation => "VALIDATION",
            GhostErrorKind::State => "STATE",
            GhostErrorKind::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// A single normalized failure, attached to step records and IPC envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-full", derive(Serialize, Deserialize))]
pub struct ErrorDetail {
    pub kind: GhostErrorKind,
    pub message: String,
    pub retriable: bool,
    pub source_component: String,
}

impl ErrorDetail {
    pub fn new(kind: GhostErrorKind, message: impl Into<String>, source_component: impl Into<String>) -> Self {
        let retriable = kind.is_retriable();
        Self {
            kind,
            message: message.into(),
            retriable,
            source_component: source_component.into(),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.kind, self.message, self.source_component)
    }
}

/// Task scheduling priority. FOREGROUND always preempts queued BACKGROUND
/// waiters; there is no weighted sharing between the two (see
/// [`Priority::queue_rank`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-full", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Priority {
    Background,
    Foreground,
}

impl Priority {
    /// Lower rank dequeues first. Used as the primary sort key ahead of
    /// enqueue timestamp.
    pub fn queue_rank(&self) -> u8 {
        match self {
            Priority::Foreground => 0,
            Priority::Background => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Foreground => "FOREGROUND",
            Priority::Background => "BACKGROUND",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-full", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
pub enum Tier {
    /// Fast AX-tree-only reasoning.
    Tier1,
    /// Vision-augmented reasoning.
    Tier2,
    /// Scroll-and-retry recovery tier.
    Tier3,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Tier1 => "tier1",
            Tier::Tier2 => "tier2",
            Tier::Tier3 => "tier3",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("task-"));
    }

    #[test]
    fn ids_roundtrip_through_string() {
        let id = ContextId::from("ctx-fixed".to_string());
        assert_eq!(id.to_string(), "ctx-fixed");
    }

    #[test]
    fn foreground_outranks_background_in_queue_order() {
        assert!(Priority::Foreground.queue_rank() < Priority::Background.queue_rank());
    }

    #[test]
    fn retriable_kinds_match_taxonomy() {
        assert!(GhostErrorKind::Network.is_retriable());
        assert!(GhostErrorKind::Cdp.is_retriable());
        assert!(GhostErrorKind::Timeout.is_retriable());
        assert!(!GhostErrorKind::Validation.is_retriable());
        assert!(!GhostErrorKind::State.is_retriable());
    }
}
