use crate::error::DecomposerError;
use crate::types::SubtaskSpec;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Produces a sequential subtask plan for an intent. A real implementation
/// calls a remote planning model; [`FakeSubtaskPlanner`] replays a scripted
/// plan for tests and the demo CLI.
#[async_trait]
pub trait SubtaskPlanner: Send + Sync {
    async fn plan(&self, intent: &str) -> Result<Vec<SubtaskSpec>, DecomposerError>;
}

pub struct FakeSubtaskPlanner {
    plan: Mutex<Vec<SubtaskSpec>>,
}

impl FakeSubtaskPlanner {
    pub fn new(plan: Vec<SubtaskSpec>) -> Self {
        Self { plan: Mutex::new(plan) }
    }
}

#[async_trait]
impl SubtaskPlanner for FakeSubtaskPlanner {
    async fn plan(&self, _intent: &str) -> Result<Vec<SubtaskSpec>, DecomposerError> {
        let plan = self.plan.lock().clone();
        if plan.is_empty() {
            return Err(DecomposerError::PlanningFailed("empty plan".to_string()));
        }
        Ok(plan)
    }
}
