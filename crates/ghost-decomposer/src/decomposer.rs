use crate::error::DecomposerError;
use crate::planner::SubtaskPlanner;
use crate::types::{Checkpoint, Subtask, SubtaskStatus};
use crate::verify::{verify, VerificationContext};
use ghost_perception::{LoopOutcome, LoopStatus, PerceptionLoop};
use std::sync::Arc;
use tracing::{info, warn};

/// One subtask's outcome, surfaced to the caller so it can emit a SUBTASK
/// status event.
#[derive(Debug, Clone)]
pub struct SubtaskOutcome {
    pub index: usize,
    pub status: SubtaskStatus,
    pub loop_outcome: LoopOutcome,
}

/// The full decomposition run: every subtask attempted this call (completed
/// subtasks from a prior attempt are skipped entirely, per the checkpoint),
/// plus the checkpoint as it stood when the run stopped.
#[derive(Debug, Clone)]
pub struct DecompositionResult {
    pub subtasks: Vec<Subtask>,
    pub checkpoint: Checkpoint,
    pub outcomes: Vec<SubtaskOutcome>,
    pub failed: Option<DecomposerError>,
}

/// Wraps a [`PerceptionLoop`] with sequential subtask planning, per-subtask
/// verification, and checkpoint-based resume (component C6).
pub struct Decomposer {
    planner: Arc<dyn SubtaskPlanner>,
}

impl Decomposer {
    pub fn new(planner: Arc<dyn SubtaskPlanner>) -> Self {
        Self { planner }
    }

    /// Runs (or resumes) a decomposition. `checkpoint` carries forward from
    /// a prior attempt; pass [`Checkpoint::new`] for a first attempt.
    /// `existing_subtasks` is `None` on a first attempt, or the subtask list
    /// from the prior attempt (with their artifacts) on retry.
    pub async fn run(
        &self,
        intent: &str,
        checkpoint: Checkpoint,
        existing_subtasks: Option<Vec<Subtask>>,
        perception_loop: &PerceptionLoop,
        max_steps_per_subtask: u32,
    ) -> DecompositionResult {
        let mut subtasks = match existing_subtasks {
            Some(subtasks) => subtasks,
            None => match self.planner.plan(intent).await {
                Ok(specs) => specs.into_iter().map(Subtask::from_spec).collect(),
                Err(err) => {
                    return DecompositionResult {
                        subtasks: Vec::new(),
                        checkpoint,
                        outcomes: Vec::new(),
                        failed: Some(err),
                    };
                }
            },
        };

        let mut checkpoint = checkpoint;
        let mut outcomes = Vec::new();
        let resume_at = checkpoint.resume_index();

        for index in 0..subtasks.len() {
            if index < resume_at {
                info!(target: "decomposer", index, "skipping already-completed subtask");
                continue;
            }

            subtasks[index].status = SubtaskStatus::InProgress;
            let subtask = &subtasks[index];
            let loop_outcome = perception_loop.run(&subtask.intent, None, max_steps_per_subtask).await;

            if loop_outcome.status != LoopStatus::Completed {
                let reason = loop_outcome.error_message.clone().unwrap_or_else(|| format!("{:?}", loop_outcome.status));
                subtasks[index].status = SubtaskStatus::Failed;
                warn!(target: "decomposer", index, %reason, "subtask loop did not complete");
                outcomes.push(SubtaskOutcome { index, status: SubtaskStatus::Failed, loop_outcome: loop_outcome.clone() });
                return DecompositionResult {
                    subtasks,
                    checkpoint,
                    outcomes,
                    failed: Some(DecomposerError::SubtaskLoopFailed { index, reason }),
                };
            }

            let context = VerificationContext {
                final_url: loop_outcome.final_url.clone(),
                final_message: loop_outcome.history.last().map(|s| s.reasoning.clone()),
            };

            match verify(index, &subtasks[index].verification, &context) {
                Ok(()) => {
                    let artifact = loop_outcome.final_url.clone().unwrap_or_default();
                    subtasks[index].status = SubtaskStatus::Complete;
                    subtasks[index].artifact = Some(artifact.clone());
                    checkpoint.record_complete(index, artifact);
                    info!(target: "decomposer", index, "subtask complete");
                    outcomes.push(SubtaskOutcome { index, status: SubtaskStatus::Complete, loop_outcome });
                }
                Err(err) => {
                    subtasks[index].status = SubtaskStatus::Failed;
                    warn!(target: "decomposer", index, %err, "subtask verification failed");
                    outcomes.push(SubtaskOutcome { index, status: SubtaskStatus::Failed, loop_outcome });
                    return DecompositionResult { subtasks, checkpoint, outcomes, failed: Some(err) };
                }
            }
        }

        DecompositionResult { subtasks, checkpoint, outcomes, failed: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::FakeSubtaskPlanner;
    use crate::types::{SubtaskSpec, Verification};
    use ghost_driver::{Action, BrowserDriver, FakeBrowserDriver};
    use ghost_perception::{Decision, FakeReasoner, PerceptionConfig};

    fn two_step_plan() -> Vec<SubtaskSpec> {
        vec![
            SubtaskSpec { intent: "search for the product".to_string(), verification: Verification::url_contains("search") },
            SubtaskSpec { intent: "add it to the cart".to_string(), verification: Verification::url_contains("cart") },
        ]
    }

    #[tokio::test]
    async fn runs_every_subtask_in_order_on_a_first_attempt() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.navigate("https://shop.example.com/search", 1000).await.unwrap();
        let reasoner = Arc::new(FakeReasoner::new(vec![
            Decision::new(Action::Done, 0.95, "first subtask done"),
            Decision::new(Action::Done, 0.95, "second subtask done"),
        ]));
        let loop_engine = PerceptionLoop::new(driver.clone(), reasoner.clone(), reasoner, PerceptionConfig::default());
        let planner = Arc::new(FakeSubtaskPlanner::new(two_step_plan()));
        let decomposer = Decomposer::new(planner);

        let result = decomposer.run("buy the product", Checkpoint::new(), None, &loop_engine, 5).await;

        assert!(result.failed.is_none());
        assert_eq!(result.checkpoint.last_completed_subtask_index, 0);
        assert_eq!(result.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn verification_failure_stops_the_run_without_advancing_checkpoint() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.navigate("https://shop.example.com/home", 1000).await.unwrap();
        let reasoner = Arc::new(FakeReasoner::new(vec![Decision::new(Action::Done, 0.95, "done but wrong page")]));
        let loop_engine = PerceptionLoop::new(driver, reasoner.clone(), reasoner, PerceptionConfig::default());
        let planner = Arc::new(FakeSubtaskPlanner::new(two_step_plan()));
        let decomposer = Decomposer::new(planner);

        let result = decomposer.run("buy the product", Checkpoint::new(), None, &loop_engine, 5).await;

        assert!(result.failed.is_some());
        assert_eq!(result.checkpoint.last_completed_subtask_index, -1);
    }

    #[tokio::test]
    async fn resume_skips_already_completed_subtasks() {
        let driver = Arc::new(FakeBrowserDriver::new(ghost_core_types::ContextId::new()));
        driver.navigate("https://shop.example.com/cart", 1000).await.unwrap();
        let reasoner = Arc::new(FakeReasoner::new(vec![Decision::new(Action::Done, 0.95, "second subtask done")]));
        let loop_engine = PerceptionLoop::new(driver, reasoner.clone(), reasoner, PerceptionConfig::default());
        let planner = Arc::new(FakeSubtaskPlanner::new(two_step_plan()));
        let decomposer = Decomposer::new(planner);

        let mut checkpoint = Checkpoint::new();
        checkpoint.record_complete(0, "https://shop.example.com/search".to_string());
        let existing: Vec<Subtask> = two_step_plan().into_iter().map(Subtask::from_spec).collect();

        let result = decomposer.run("buy the product", checkpoint, Some(existing), &loop_engine, 5).await;

        assert!(result.failed.is_none());
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.checkpoint.last_completed_subtask_index, 1);
    }
}
