use ghost_core_types::SubtaskId;

/// Status of one subtask within a decomposition. Monotonic over a task's
/// lifetime: once COMPLETE, a subtask is never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskStatus {
    Pending,
    InProgress,
    Complete,
    Failed,
}

/// How a subtask's outcome is confirmed after its loop terminates.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationKind {
    UrlContains,
    UrlEquals,
    UrlMatches,
    FinalMessageContains,
    Custom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub kind: VerificationKind,
    pub condition: String,
}

impl Verification {
    pub fn url_contains(condition: impl Into<String>) -> Self {
        Self { kind: VerificationKind::UrlContains, condition: condition.into() }
    }

    pub fn url_matches(pattern: impl Into<String>) -> Self {
        Self { kind: VerificationKind::UrlMatches, condition: pattern.into() }
    }

    pub fn custom(condition: impl Into<String>) -> Self {
        Self { kind: VerificationKind::Custom, condition: condition.into() }
    }
}

/// What the planner produces for one subtask before it has ever run.
#[derive(Debug, Clone)]
pub struct SubtaskSpec {
    pub intent: String,
    pub verification: Verification,
}

/// A subtask plus the state it has accumulated across attempts.
#[derive(Debug, Clone)]
pub struct Subtask {
    pub id: SubtaskId,
    pub intent: String,
    pub verification: Verification,
    pub status: SubtaskStatus,
    pub artifact: Option<String>,
}

impl Subtask {
    pub fn from_spec(spec: SubtaskSpec) -> Self {
        Self {
            id: SubtaskId::new(),
            intent: spec.intent,
            verification: spec.verification,
            status: SubtaskStatus::Pending,
            artifact: None,
        }
    }
}

/// Resumption record: the index of the last subtask to reach COMPLETE
/// (`-1` means nothing has completed yet) plus each completed subtask's
/// artifact, keyed by index. Owned by the task's record; never shared.
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    pub last_completed_subtask_index: i64,
    artifacts: Vec<(usize, String)>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self { last_completed_subtask_index: -1, artifacts: Vec::new() }
    }

    pub fn resume_index(&self) -> usize {
        (self.last_completed_subtask_index + 1).max(0) as usize
    }

    pub fn record_complete(&mut self, index: usize, artifact: String) {
        self.artifacts.push((index, artifact));
        self.last_completed_subtask_index = index as i64;
    }

    pub fn artifact_for(&self, index: usize) -> Option<&str> {
        self.artifacts.iter().find(|(i, _)| *i == index).map(|(_, a)| a.as_str())
    }
}
