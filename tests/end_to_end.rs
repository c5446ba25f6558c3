use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ghost_context_pool::{ContextFactory, FakeContextFactory};
use ghost_core_types::{ContextId, Priority};
use ghost_driver::{Action, BrowserDriver, FakeBrowserDriver};
use ghost_perception::{Decision, FakeReasoner};
use ghost_scheduler::{TaskOutcome, TaskSpec, TaskStatusView};
use ghost_tabs::app::AppContext;
use ghost_tabs::config::GhostConfig;
use ghost_tabs::intent::{classify_intent, IntentClass};

fn done_reasoner() -> Arc<FakeReasoner> {
    Arc::new(FakeReasoner::new(vec![Decision::new(Action::Done, 0.95, "done")]))
}

async fn poll_until_terminal(ctx: &AppContext, task_id: &ghost_core_types::TaskId) -> TaskStatusView {
    for _ in 0..400 {
        let view = ctx.scheduler.status(task_id).expect("task must exist");
        if view.outcome.is_some() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} never reached a terminal outcome");
}

/// S1: a single foreground task with a one-step Tier 1 decision runs to
/// COMPLETE through the full pool/scheduler/perception wiring.
#[tokio::test]
async fn single_task_completes_through_the_full_stack() {
    let config = GhostConfig { context_count: 1, warm_minimum: 1, ..GhostConfig::default() };
    let ctx = AppContext::build_with(config, Arc::new(FakeContextFactory), None, done_reasoner());

    let task_id = ctx.scheduler.submit(TaskSpec {
        intent: "search for mechanical keyboards".to_string(),
        priority: Priority::Foreground,
        ..Default::default()
    });

    let view = poll_until_terminal(&ctx, &task_id).await;
    assert_eq!(view.outcome, Some(TaskOutcome::Succeeded));
}

/// S6: a context that crashes on its first lease recovers on retry and the
/// task still reaches SUCCEEDED.
#[tokio::test]
async fn crashed_context_recovers_on_retry() {
    struct CrashOnceFactory {
        created: AtomicUsize,
    }

    impl ContextFactory for CrashOnceFactory {
        fn create(&self, context_id: &ContextId) -> Arc<dyn BrowserDriver> {
            let driver = FakeBrowserDriver::new(context_id.clone());
            if self.created.fetch_add(1, Ordering::SeqCst) == 0 {
                driver.trigger_crash("renderer died");
            }
            Arc::new(driver)
        }
    }

    let config = GhostConfig { context_count: 1, warm_minimum: 1, ..GhostConfig::default() };
    let factory = Arc::new(CrashOnceFactory { created: AtomicUsize::new(0) });
    let ctx = AppContext::build_with(config, factory, None, done_reasoner());

    let task_id = ctx.scheduler.submit(TaskSpec { intent: "retry after crash".to_string(), max_retries: 1, ..Default::default() });

    let view = poll_until_terminal(&ctx, &task_id).await;
    assert_eq!(view.outcome, Some(TaskOutcome::Succeeded));
    assert_eq!(view.attempt, 1);
}

/// A task cancelled before it is dispatched never acquires a context and
/// is reported CANCELLED without a second cancellation taking effect.
#[tokio::test]
async fn cancelling_a_queued_task_frees_it_without_a_context() {
    let config = GhostConfig { context_count: 1, warm_minimum: 1, ..GhostConfig::default() };
    let ctx = AppContext::build_with(config, Arc::new(FakeContextFactory), None, done_reasoner());

    let holder = ctx.scheduler.submit(TaskSpec { intent: "hold the slot".to_string(), max_steps: 1, ..Default::default() });
    let _ = poll_until_terminal(&ctx, &holder).await;

    let queued = ctx.scheduler.submit(TaskSpec { intent: "never runs".to_string(), ..Default::default() });
    assert!(ctx.scheduler.cancel_task(&queued));
    let view = ctx.scheduler.status(&queued).unwrap();
    assert_eq!(view.outcome, Some(TaskOutcome::Cancelled));
    assert!(view.context_id.is_none());
    assert!(!ctx.scheduler.cancel_task(&queued));
}

/// Background priority is the tiebreaker for queueing order; the default
/// build wires the same priority the caller asked for through to the pool.
#[tokio::test]
async fn background_task_still_completes_when_capacity_allows_it() {
    let config = GhostConfig { context_count: 2, warm_minimum: 1, ..GhostConfig::default() };
    let ctx = AppContext::build_with(config, Arc::new(FakeContextFactory), None, done_reasoner());

    let task_id = ctx.scheduler.submit(TaskSpec { intent: "low priority cleanup".to_string(), priority: Priority::Background, ..Default::default() });

    let view = poll_until_terminal(&ctx, &task_id).await;
    assert_eq!(view.outcome, Some(TaskOutcome::Succeeded));
}

#[test]
#[serial_test::serial]
fn config_from_env_reflects_an_explicit_override() {
    std::env::set_var("PHASE2_CONFIDENCE_THRESHOLD", "0.5");
    let config = GhostConfig::from_env().expect("config must build");
    std::env::remove_var("PHASE2_CONFIDENCE_THRESHOLD");
    assert_eq!(config.confidence_threshold, 0.5);
}

#[test]
fn intent_classification_feeds_the_demo_wiring() {
    assert_eq!(classify_intent("book a flight to Rome", None), IntentClass::Transact);
    assert_eq!(classify_intent("anything", Some("navigate")), IntentClass::ModeOverride);
}
