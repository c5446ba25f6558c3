use ghost_core_types::{ContextId, Priority};
use ghost_decomposer::SubtaskSpec;
use ghost_task_state::TaskState;

/// What the caller wants done. `decomposition` turns this into a C6 run
/// instead of a single C5 attempt.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub intent: String,
    pub start_url: Option<String>,
    pub priority: Priority,
    pub max_steps: u32,
    pub max_retries: u32,
    pub decomposition: Option<Vec<SubtaskSpec>>,
    pub resource_budget: Option<ResourceBudget>,
}

impl Default for TaskSpec {
    fn default() -> Self {
        Self {
            intent: String::new(),
            start_url: None,
            priority: Priority::Foreground,
            max_steps: 20,
            max_retries: 0,
            decomposition: None,
            resource_budget: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementMode {
    WarnOnly,
    KillTab,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceBudget {
    pub cpu_percent_limit: f64,
    pub memory_mb_limit: f64,
    pub mode: EnforcementMode,
    pub sample_interval_ms: u64,
}

impl Default for ResourceBudget {
    fn default() -> Self {
        Self { cpu_percent_limit: 80.0, memory_mb_limit: 1024.0, mode: EnforcementMode::WarnOnly, sample_interval_ms: 5000 }
    }
}

impl ResourceBudget {
    pub fn is_exceeded(&self, sample: &ResourceSample) -> bool {
        sample.cpu_percent > self.cpu_percent_limit || sample.memory_mb > self.memory_mb_limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

/// Frozen view of a task's progress, preserved on CANCELLED and readable at
/// any point during a FAILED attempt.
#[derive(Debug, Clone, Default)]
pub struct ResultSnapshot {
    pub last_url: Option<String>,
    pub last_action: Option<String>,
    pub progress_label: Option<String>,
}

/// Point-in-time view of a task for status queries. Not the scheduler's
/// internal record — a read-only copy.
#[derive(Debug, Clone)]
pub struct TaskStatusView {
    pub state: TaskState,
    pub outcome: Option<TaskOutcome>,
    pub attempt: u32,
    pub context_id: Option<ContextId>,
    pub snapshot: ResultSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_under_both_limits_does_not_exceed() {
        let budget = ResourceBudget::default();
        let sample = ResourceSample { cpu_percent: 10.0, memory_mb: 200.0 };
        assert!(!budget.is_exceeded(&sample));
    }

    #[test]
    fn sample_over_cpu_limit_alone_exceeds() {
        let budget = ResourceBudget { cpu_percent_limit: 50.0, ..ResourceBudget::default() };
        let sample = ResourceSample { cpu_percent: 75.0, memory_mb: 0.0 };
        assert!(budget.is_exceeded(&sample));
    }

    #[test]
    fn sample_over_memory_limit_alone_exceeds() {
        let budget = ResourceBudget { memory_mb_limit: 512.0, ..ResourceBudget::default() };
        let sample = ResourceSample { cpu_percent: 0.0, memory_mb: 600.0 };
        assert!(budget.is_exceeded(&sample));
    }

    #[test]
    fn default_task_spec_runs_foreground_with_no_retries() {
        let spec = TaskSpec::default();
        assert_eq!(spec.priority, Priority::Foreground);
        assert_eq!(spec.max_retries, 0);
        assert!(spec.decomposition.is_none());
    }
}
