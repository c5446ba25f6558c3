use crate::error::SchedulerError;
use crate::resource::ResourceSampler;
use crate::status::{emit_queue, emit_scheduler, emit_subtask};
use crate::types::{EnforcementMode, ResourceBudget, TaskOutcome, TaskSpec, TaskStatusView};
use ghost_context_pool::ContextPool;
use ghost_core_types::{ContextId, Priority, TaskId};
use ghost_decomposer::{Checkpoint, Decomposer, Subtask, SubtaskPlanner, SubtaskStatus as DecomposerSubtaskStatus};
use ghost_ipc::{QueueEventKind, SchedulerEventKind, StatusBus};
use ghost_perception::{LoopStatus, PerceptionConfig, PerceptionLoop, Tier1Reasoner, Tier2Reasoner};
use ghost_task_state::TaskState;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{info, warn};

struct TaskRecord {
    spec: TaskSpec,
    state: TaskState,
    outcome: Option<TaskOutcome>,
    attempt: u32,
    context_id: Option<ContextId>,
    snapshot: crate::types::ResultSnapshot,
    checkpoint: Checkpoint,
    subtasks: Option<Vec<Subtask>>,
    cancelled: bool,
    terminal: bool,
}

impl TaskRecord {
    fn new(spec: TaskSpec) -> Self {
        Self {
            spec,
            state: TaskState::Idle,
            outcome: None,
            attempt: 0,
            context_id: None,
            snapshot: crate::types::ResultSnapshot::default(),
            checkpoint: Checkpoint::new(),
            subtasks: None,
            cancelled: false,
            terminal: false,
        }
    }

    /// Termination guard: the first call to reach a terminal outcome wins;
    /// every later one (a crash signal racing a success, a budget kill
    /// racing cancellation) is silently discarded.
    fn try_finalize(&mut self, state: TaskState, outcome: TaskOutcome) -> bool {
        if self.terminal {
            return false;
        }
        self.state = state;
        self.outcome = Some(outcome);
        self.terminal = true;
        true
    }
}

/// Classifies a loop/decomposer failure message as scheduler-retryable.
/// Driver-originated failures render as `DriverError`'s `"[KIND] message"`
/// format; timeouts and CDP/network errors are transient and retried,
/// validation failures and explicit agent `FAILED` actions are not.
fn is_retryable_failure(message: &str) -> bool {
    message.starts_with("[TIMEOUT]") || message.starts_with("[CDP]") || message.starts_with("[NETWORK]")
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Foreground => "foreground",
        Priority::Background => "background",
    }
}

/// Orchestrates task submission across the warm context pool: priority
/// dispatch (delegated to [`ContextPool::acquire`]), crash-triggered
/// retries, resource budget enforcement, cancellation, and status emission
/// (component C7).
pub struct Scheduler {
    pool: Arc<ContextPool>,
    tier1: Arc<dyn Tier1Reasoner>,
    tier2: Arc<dyn Tier2Reasoner>,
    planner: Option<Arc<dyn SubtaskPlanner>>,
    resource_sampler: Arc<dyn ResourceSampler>,
    perception_config: PerceptionConfig,
    status_bus: Arc<StatusBus>,
    tasks: SyncMutex<HashMap<TaskId, Arc<SyncMutex<TaskRecord>>>>,
    self_weak: Weak<Scheduler>,
}

impl Scheduler {
    pub fn new(
        pool: Arc<ContextPool>,
        tier1: Arc<dyn Tier1Reasoner>,
        tier2: Arc<dyn Tier2Reasoner>,
        planner: Option<Arc<dyn SubtaskPlanner>>,
        resource_sampler: Arc<dyn ResourceSampler>,
        perception_config: PerceptionConfig,
        status_bus: Arc<StatusBus>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            pool,
            tier1,
            tier2,
            planner,
            resource_sampler,
            perception_config,
            status_bus,
            tasks: SyncMutex::new(HashMap::new()),
            self_weak: weak.clone(),
        })
    }

    pub fn status(&self, task_id: &TaskId) -> Result<TaskStatusView, SchedulerError> {
        let tasks = self.tasks.lock();
        let record = tasks.get(task_id).ok_or_else(|| SchedulerError::TaskNotFound(task_id.to_string()))?;
        let record = record.lock();
        Ok(TaskStatusView {
            state: record.state,
            outcome: record.outcome,
            attempt: record.attempt,
            context_id: record.context_id.clone(),
            snapshot: record.snapshot.clone(),
        })
    }

    /// Submits a task and returns its id immediately; the attempt loop runs
    /// in the background.
    pub fn submit(&self, spec: TaskSpec) -> TaskId {
        let task_id = TaskId::new();
        let priority = spec.priority;
        let record = Arc::new(SyncMutex::new(TaskRecord::new(spec)));
        self.tasks.lock().insert(task_id.clone(), record);

        let placeholder_context = ContextId::new();
        emit_queue(&self.status_bus, &task_id, &placeholder_context, QueueEventKind::Enqueued);
        crate::metrics::record_enqueued(priority_label(priority));

        let returned_id = task_id.clone();
        if let Some(scheduler) = self.self_weak.upgrade() {
            tokio::spawn(async move { scheduler.drive(task_id).await });
        }
        returned_id
    }

    /// Immediately marks a task CANCELLED, freezes its snapshot, and
    /// destroys its context if one is assigned. `false` if the task is
    /// unknown or already terminal.
    pub fn cancel_task(&self, task_id: &TaskId) -> bool {
        let record = {
            let tasks = self.tasks.lock();
            match tasks.get(task_id) {
                Some(r) => Arc::clone(r),
                None => return false,
            }
        };
        let mut guard = record.lock();
        if guard.terminal {
            return false;
        }
        guard.cancelled = true;
        let current_state = guard.state;
        let finalized = guard.try_finalize(current_state, TaskOutcome::Cancelled);
        let context_id = guard.context_id.clone();
        drop(guard);
        if finalized {
            crate::metrics::record_finalized("cancelled");
        }
        if let Some(context_id) = context_id {
            self.pool.destroy(&context_id, true);
        }
        finalized
    }

    async fn drive(self: Arc<Self>, task_id: TaskId) {
        let total_attempts = {
            let tasks = self.tasks.lock();
            let record = tasks.get(&task_id).expect("task just submitted").lock();
            record.spec.max_retries + 1
        };

        for attempt in 0..total_attempts {
            if self.is_cancelled(&task_id) {
                return;
            }
            self.set_attempt(&task_id, attempt);

            if attempt > 0 {
                let placeholder = ContextId::new();
                emit_queue(&self.status_bus, &task_id, &placeholder, QueueEventKind::Enqueued);
            }

            let priority = self.spec_priority(&task_id);
            let dispatch_wait_start = std::time::Instant::now();
            let lease = match self.pool.acquire(priority).await {
                Ok(lease) => lease,
                Err(_) => {
                    self.finalize(&task_id, TaskState::Failed, TaskOutcome::Failed);
                    return;
                }
            };
            crate::metrics::observe_dispatch_latency_ms(
                priority_label(priority),
                dispatch_wait_start.elapsed().as_secs_f64() * 1000.0,
            );

            if self.is_cancelled(&task_id) {
                self.pool.destroy(&lease.context_id, true);
                return;
            }

            let context_id = lease.context_id.clone();
            self.set_context(&task_id, context_id.clone());
            emit_queue(&self.status_bus, &task_id, &context_id, QueueEventKind::Dispatched);
            emit_scheduler(&self.status_bus, &task_id, &context_id, SchedulerEventKind::Started, None);

            let outcome = self.run_attempt(&task_id, &lease, &context_id).await;

            match outcome {
                AttemptResult::Succeeded { final_url } => {
                    self.pool.release(lease, false);
                    self.set_snapshot_url(&task_id, final_url);
                    emit_scheduler(&self.status_bus, &task_id, &context_id, SchedulerEventKind::Succeeded, None);
                    emit_queue(&self.status_bus, &task_id, &context_id, QueueEventKind::Released);
                    self.finalize(&task_id, TaskState::Complete, TaskOutcome::Succeeded);
                    return;
                }
                AttemptResult::Crashed { reason } => {
                    self.pool.destroy(&context_id, true);
                    emit_scheduler(&self.status_bus, &task_id, &context_id, SchedulerEventKind::CrashDetected, Some(reason));
                    emit_queue(&self.status_bus, &task_id, &context_id, QueueEventKind::Released);
                    if attempt + 1 < total_attempts {
                        crate::metrics::record_retry("crash");
                        emit_scheduler(&self.status_bus, &task_id, &context_id, SchedulerEventKind::Retrying, None);
                        continue;
                    }
                    self.finalize(&task_id, TaskState::Failed, TaskOutcome::Failed);
                    return;
                }
                AttemptResult::BudgetKilled => {
                    self.pool.destroy(&context_id, true);
                    emit_scheduler(&self.status_bus, &task_id, &context_id, SchedulerEventKind::ResourceBudgetKilled, None);
                    emit_queue(&self.status_bus, &task_id, &context_id, QueueEventKind::Released);
                    self.finalize(&task_id, TaskState::Failed, TaskOutcome::Failed);
                    return;
                }
                AttemptResult::Failed { reason, retryable } => {
                    self.pool.release(lease, false);
                    emit_scheduler(&self.status_bus, &task_id, &context_id, SchedulerEventKind::Failed, Some(reason));
                    emit_queue(&self.status_bus, &task_id, &context_id, QueueEventKind::Released);
                    if retryable && attempt + 1 < total_attempts {
                        crate::metrics::record_retry("failure");
                        emit_scheduler(&self.status_bus, &task_id, &context_id, SchedulerEventKind::Retrying, None);
                        continue;
                    }
                    self.finalize(&task_id, TaskState::Failed, TaskOutcome::Failed);
                    return;
                }
            }
        }
    }

    async fn run_attempt(&self, task_id: &TaskId, lease: &ghost_context_pool::ContextLease, context_id: &ContextId) -> AttemptResult {
        let driver = lease.driver().clone();
        let mut crash_rx = driver.subscribe_crash_signal();
        let resource_budget = self.spec_resource_budget(task_id).unwrap_or_default();
        let sampler = Arc::clone(&self.resource_sampler);
        let sample_context = context_id.clone();

        let decomposition = self.spec_decomposition(task_id);
        let loop_engine = PerceptionLoop::new(driver, Arc::clone(&self.tier1), Arc::clone(&self.tier2), self.perception_config);
        let max_steps = self.spec_max_steps(task_id);
        let intent = self.spec_intent(task_id);

        let work = if let Some(specs) = decomposition {
            let planner = self.planner.clone().unwrap_or_else(|| Arc::new(NullPlanner) as Arc<dyn SubtaskPlanner>);
            let checkpoint = self.checkpoint_for(task_id);
            // On a fresh attempt the record carries no subtasks yet; seed them
            // straight from the caller-supplied specs instead of asking the
            // planner to regenerate a plan it never produced in the first place.
            let existing = self.subtasks_for(task_id).or_else(|| {
                Some(specs.into_iter().map(ghost_decomposer::Subtask::from_spec).collect())
            });
            let decomposer = Decomposer::new(planner);
            let bus = Arc::clone(&self.status_bus);
            let record = self.record_for(task_id);
            let task_id = task_id.clone();
            let context_id = context_id.clone();
            tokio::spawn(async move {
                let result = decomposer.run(&intent, checkpoint, existing, &loop_engine, max_steps).await;
                for outcome in &result.outcomes {
                    let status_str = match outcome.status {
                        DecomposerSubtaskStatus::Complete => "COMPLETE",
                        DecomposerSubtaskStatus::Failed => "FAILED",
                        DecomposerSubtaskStatus::InProgress => "IN_PROGRESS",
                        DecomposerSubtaskStatus::Pending => "PENDING",
                    };
                    let subtask_id = result.subtasks[outcome.index].id.clone();
                    emit_subtask(&bus, &task_id, &context_id, subtask_id, status_str, result.checkpoint.last_completed_subtask_index);
                }
                if let Some(record) = record {
                    let mut guard = record.lock();
                    guard.subtasks = Some(result.subtasks.clone());
                    guard.checkpoint = result.checkpoint.clone();
                }
                Work::Decomposed(result)
            })
        } else {
            tokio::spawn(async move { Work::Single(loop_engine.run(&intent, None, max_steps).await) })
        };

        let mut ticker = tokio::time::interval(Duration::from_millis(resource_budget.sample_interval_ms.max(50)));
        ticker.tick().await;

        tokio::select! {
            join_result = work => {
                match join_result {
                    Ok(Work::Single(outcome)) => classify_single(outcome),
                    Ok(Work::Decomposed(result)) => classify_decomposed(result),
                    Err(_) => AttemptResult::Failed { reason: "attempt task panicked".to_string(), retryable: true },
                }
            }
            crash = crash_rx.recv() => {
                let reason = crash.map(|c| c.reason).unwrap_or_else(|_| "crash signal channel closed".to_string());
                AttemptResult::Crashed { reason }
            }
            _ = async {
                loop {
                    ticker.tick().await;
                    let sample = sampler.sample(&sample_context).await;
                    if resource_budget.is_exceeded(&sample) {
                        if resource_budget.mode == EnforcementMode::KillTab {
                            break;
                        } else {
                            warn!(target: "scheduler", context_id = %sample_context, "resource budget exceeded (warn-only)");
                        }
                    }
                }
            } => {
                AttemptResult::BudgetKilled
            }
        }
    }

    fn is_cancelled(&self, task_id: &TaskId) -> bool {
        let tasks = self.tasks.lock();
        tasks.get(task_id).map(|r| r.lock().cancelled).unwrap_or(true)
    }

    fn set_attempt(&self, task_id: &TaskId, attempt: u32) {
        if let Some(record) = self.tasks.lock().get(task_id) {
            record.lock().attempt = attempt;
        }
    }

    fn set_context(&self, task_id: &TaskId, context_id: ContextId) {
        if let Some(record) = self.tasks.lock().get(task_id) {
            record.lock().context_id = Some(context_id);
        }
    }

    fn set_snapshot_url(&self, task_id: &TaskId, url: Option<String>) {
        if let Some(record) = self.tasks.lock().get(task_id) {
            record.lock().snapshot.last_url = url;
        }
    }

    fn spec_priority(&self, task_id: &TaskId) -> Priority {
        self.tasks.lock().get(task_id).map(|r| r.lock().spec.priority).unwrap_or(Priority::Background)
    }

    fn spec_max_steps(&self, task_id: &TaskId) -> u32 {
        self.tasks.lock().get(task_id).map(|r| r.lock().spec.max_steps).unwrap_or(20)
    }

    fn spec_intent(&self, task_id: &TaskId) -> String {
        self.tasks.lock().get(task_id).map(|r| r.lock().spec.intent.clone()).unwrap_or_default()
    }

    fn spec_decomposition(&self, task_id: &TaskId) -> Option<Vec<ghost_decomposer::SubtaskSpec>> {
        self.tasks.lock().get(task_id).and_then(|r| r.lock().spec.decomposition.clone())
    }

    fn spec_resource_budget(&self, task_id: &TaskId) -> Option<ResourceBudget> {
        self.tasks.lock().get(task_id).and_then(|r| r.lock().spec.resource_budget)
    }

    fn checkpoint_for(&self, task_id: &TaskId) -> Checkpoint {
        self.tasks.lock().get(task_id).map(|r| r.lock().checkpoint.clone()).unwrap_or_default()
    }

    fn subtasks_for(&self, task_id: &TaskId) -> Option<Vec<Subtask>> {
        self.tasks.lock().get(task_id).and_then(|r| r.lock().subtasks.clone())
    }

    fn record_for(&self, task_id: &TaskId) -> Option<Arc<SyncMutex<TaskRecord>>> {
        self.tasks.lock().get(task_id).cloned()
    }

    fn finalize(&self, task_id: &TaskId, state: TaskState, outcome: TaskOutcome) {
        if let Some(record) = self.tasks.lock().get(task_id) {
            let mut guard = record.lock();
            if guard.try_finalize(state, outcome) {
                info!(target: "scheduler", task_id = %task_id, ?outcome, "task finalized");
                let label = match outcome {
                    TaskOutcome::Succeeded => "succeeded",
                    TaskOutcome::Failed => "failed",
                    TaskOutcome::Cancelled => "cancelled",
                };
                crate::metrics::record_finalized(label);
            }
        }
    }
}

enum Work {
    Single(ghost_perception::LoopOutcome),
    Decomposed(ghost_decomposer::DecompositionResult),
}

enum AttemptResult {
    Succeeded { final_url: Option<String> },
    Failed { reason: String, retryable: bool },
    Crashed { reason: String },
    BudgetKilled,
}

fn classify_single(outcome: ghost_perception::LoopOutcome) -> AttemptResult {
    if outcome.status == LoopStatus::Completed {
        AttemptResult::Succeeded { final_url: outcome.final_url }
    } else {
        let reason = outcome.error_message.unwrap_or_else(|| format!("{:?}", outcome.status));
        let retryable = is_retryable_failure(&reason);
        AttemptResult::Failed { reason, retryable }
    }
}

fn classify_decomposed(result: ghost_decomposer::DecompositionResult) -> AttemptResult {
    match result.failed {
        None => {
            let final_url = result.subtasks.last().and_then(|s| s.artifact.clone());
            AttemptResult::Succeeded { final_url }
        }
        Some(err) => {
            let reason = err.to_string();
            let retryable = is_retryable_failure(&reason);
            AttemptResult::Failed { reason, retryable }
        }
    }
}

/// Degenerate planner used when a task supplies its own subtask specs
/// directly and no planner model is configured. Never actually invoked:
/// [`Scheduler::run_attempt`] always seeds `existing_subtasks` from the
/// spec in that case, so `Decomposer::run` never falls through to `plan`.
struct NullPlanner;

#[async_trait::async_trait]
impl SubtaskPlanner for NullPlanner {
    async fn plan(&self, _intent: &str) -> Result<Vec<ghost_decomposer::SubtaskSpec>, ghost_decomposer::DecomposerError> {
        Err(ghost_decomposer::DecomposerError::PlanningFailed("no planner configured".to_string()))
    }
}
