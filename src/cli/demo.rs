use anyhow::Result;
use ghost_core_types::Priority;
use ghost_event_bus::Bus;
use ghost_ipc::ThrottledStatusView;
use ghost_scheduler::TaskSpec;

use crate::app::AppContext;
use crate::cli::env::RunDemoArgs;
use crate::config::GhostConfig;

const DEMO_INTENT: &str = "research the top three headlines on the homepage and summarize them";

/// Runs one scripted task through the real pool/scheduler/perception
/// pipeline against the in-memory fakes, so the wiring can be exercised
/// without a live browser or model.
pub async fn run(args: RunDemoArgs, config: GhostConfig) -> Result<()> {
    let ctx = AppContext::build(config.clone());
    let spec = TaskSpec {
        intent: DEMO_INTENT.to_string(),
        start_url: Some("https://example.com".to_string()),
        priority: Priority::Foreground,
        max_steps: config.max_steps_default,
        max_retries: config.max_retries_default,
        decomposition: None,
        resource_budget: None,
    };

    let task_id = ctx.scheduler.submit(spec);
    println!("demo task {task_id} submitted");

    if !args.quiet {
        let mut view = ThrottledStatusView::new(ctx.status_bus.subscribe(), config.status_broadcast_hz);
        for _ in 0..16 {
            let Some(envelope) = view.next().await else { break };
            if envelope.task_id != task_id {
                continue;
            }
            println!("[{}] {}", envelope.timestamp, envelope.operation());
            let status = ctx.scheduler.status(&task_id)?;
            if status.outcome.is_some() {
                break;
            }
        }
    } else {
        while ctx.scheduler.status(&task_id)?.outcome.is_none() {
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
    }

    let status = ctx.scheduler.status(&task_id)?;
    println!("demo outcome: {:?}", status.outcome);
    Ok(())
}
