//! Task state machine (component C3): a closed transition graph with
//! observable transitions, mirroring the termination bookkeeping of an
//! agent run loop controller but generalized to the seven-state lifecycle
//! the scheduler and decomposer both depend on.

use ghost_core_types::{GhostErrorKind, TaskId};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Idle,
    Loading,
    Perceiving,
    Inferring,
    Acting,
    Complete,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Complete | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Idle => "IDLE",
            TaskState::Loading => "LOADING",
            TaskState::Perceiving => "PERCEIVING",
            TaskState::Inferring => "INFERRING",
            TaskState::Acting => "ACTING",
            TaskState::Complete => "COMPLETE",
            TaskState::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Returns whether `from -> to` is one of the permitted edges:
/// `IDLE -> LOADING -> PERCEIVING -> INFERRING -> ACTING -> {PERCEIVING |
/// COMPLETE | FAILED}`, any state `-> FAILED`, and `{COMPLETE, FAILED} ->
/// IDLE` on cleanup.
fn is_permitted(from: TaskState, to: TaskState) -> bool {
    use TaskState::*;
    if to == Failed {
        return true;
    }
    match (from, to) {
        (Idle, Loading) => true,
        (Loading, Perceiving) => true,
        (Perceiving, Inferring) => true,
        (Inferring, Acting) => true,
        (Acting, Perceiving) => true,
        (Acting, Complete) => true,
        (Complete, Idle) => true,
        (Failed, Idle) => true,
        _ => false,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("illegal state transition {from} -> {to} for task {task_id}")]
pub struct TaskStateError {
    pub task_id: TaskId,
    pub from: TaskState,
    pub to: TaskState,
}

impl TaskStateError {
    pub fn kind(&self) -> GhostErrorKind {
        GhostErrorKind::State
    }
}

/// One observed transition, the payload a STATE status event carries.
#[derive(Debug, Clone)]
pub struct StateTransitionEvent {
    pub task_id: TaskId,
    pub from: TaskState,
    pub to: TaskState,
    pub step: u32,
    pub url: Option<String>,
    pub reason: String,
}

/// Owns one task's current lifecycle state and the closed transition graph.
/// The scheduler creates one per task attempt; it never outlives the
/// attempt it was built for.
pub struct TaskStateMachine {
    task_id: TaskId,
    current: TaskState,
}

impl TaskStateMachine {
    pub fn new(task_id: TaskId) -> Self {
        Self { task_id, current: TaskState::Idle }
    }

    pub fn current(&self) -> TaskState {
        self.current
    }

    /// Attempts `current -> to`. On success, updates `current` and returns
    /// the transition event; on an illegal edge, state is left unchanged
    /// and a [`TaskStateError`] is returned.
    pub fn transition(
        &mut self,
        to: TaskState,
        step: u32,
        url: Option<String>,
        reason: impl Into<String>,
    ) -> Result<StateTransitionEvent, TaskStateError> {
        let from = self.current;
        if !is_permitted(from, to) {
            return Err(TaskStateError { task_id: self.task_id.clone(), from, to });
        }
        self.current = to;
        let event = StateTransitionEvent {
            task_id: self.task_id.clone(),
            from,
            to,
            step,
            url,
            reason: reason.into(),
        };
        debug!(target: "task_state", task_id = %event.task_id, from = %from, to = %to, "state transition");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_walks_the_full_lifecycle() {
        let mut m = TaskStateMachine::new(TaskId::new());
        m.transition(TaskState::Loading, 0, None, "start").unwrap();
        m.transition(TaskState::Perceiving, 0, None, "perceive").unwrap();
        m.transition(TaskState::Inferring, 0, None, "infer").unwrap();
        m.transition(TaskState::Acting, 0, None, "act").unwrap();
        m.transition(TaskState::Complete, 0, None, "done").unwrap();
        assert_eq!(m.current(), TaskState::Complete);
    }

    #[test]
    fn acting_may_loop_back_to_perceiving() {
        let mut m = TaskStateMachine::new(TaskId::new());
        m.transition(TaskState::Loading, 0, None, "start").unwrap();
        m.transition(TaskState::Perceiving, 0, None, "p").unwrap();
        m.transition(TaskState::Inferring, 0, None, "i").unwrap();
        m.transition(TaskState::Acting, 0, None, "a").unwrap();
        m.transition(TaskState::Perceiving, 1, None, "loop").unwrap();
        assert_eq!(m.current(), TaskState::Perceiving);
    }

    #[test]
    fn any_state_may_fail() {
        let mut m = TaskStateMachine::new(TaskId::new());
        m.transition(TaskState::Failed, 0, None, "boom").unwrap();
        assert_eq!(m.current(), TaskState::Failed);
    }

    #[test]
    fn terminal_states_cleanup_to_idle() {
        let mut m = TaskStateMachine::new(TaskId::new());
        m.transition(TaskState::Failed, 0, None, "boom").unwrap();
        m.transition(TaskState::Idle, 0, None, "cleanup").unwrap();
        assert_eq!(m.current(), TaskState::Idle);
    }

    #[test]
    fn illegal_transition_is_rejected_and_state_unchanged() {
        let mut m = TaskStateMachine::new(TaskId::new());
        let err = m.transition(TaskState::Acting, 0, None, "skip ahead").unwrap_err();
        assert_eq!(err.kind(), GhostErrorKind::State);
        assert_eq!(m.current(), TaskState::Idle);
    }

    #[test]
    fn idle_cannot_jump_directly_to_complete() {
        let mut m = TaskStateMachine::new(TaskId::new());
        assert!(m.transition(TaskState::Complete, 0, None, "nope").is_err());
    }
}
