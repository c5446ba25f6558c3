use anyhow::Result;
use ghost_core_types::Priority;
use ghost_event_bus::Bus;
use ghost_ipc::{IpcPayload, SchedulerEventKind, TaskStatusPayload, ThrottledStatusView};
use ghost_scheduler::TaskSpec;
use tracing::info;

use crate::app::AppContext;
use crate::cli::env::SubmitArgs;
use crate::config::GhostConfig;
use crate::intent::classify_intent;

pub async fn run(args: SubmitArgs, config: GhostConfig) -> Result<()> {
    let ctx = AppContext::build(config.clone());
    let class = classify_intent(&args.intent, args.mode.as_deref());
    info!(intent_class = class.as_str(), "classified intent");

    let spec = TaskSpec {
        intent: args.intent,
        start_url: args.start_url,
        priority: if args.background { Priority::Background } else { Priority::Foreground },
        max_steps: args.max_steps.unwrap_or(config.max_steps_default),
        max_retries: args.max_retries.unwrap_or(config.max_retries_default),
        decomposition: None,
        resource_budget: None,
    };

    let task_id = ctx.scheduler.submit(spec);
    println!("submitted task {task_id}");

    let mut view = ThrottledStatusView::new(ctx.status_bus.subscribe(), config.status_broadcast_hz);
    loop {
        let Some(envelope) = view.next().await else { break };
        if envelope.task_id != task_id {
            continue;
        }
        println!("[{}] {}", envelope.timestamp, envelope.operation());
        if let IpcPayload::TaskStatus(TaskStatusPayload::Scheduler(status)) = &envelope.payload {
            if matches!(status.event, SchedulerEventKind::Succeeded | SchedulerEventKind::Failed) {
                break;
            }
        }
    }

    let status = ctx.scheduler.status(&task_id)?;
    println!("final state={:?} outcome={:?}", status.state, status.outcome);
    Ok(())
}
