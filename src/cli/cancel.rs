use anyhow::Result;
use ghost_core_types::TaskId;

use crate::app::AppContext;
use crate::cli::env::CancelArgs;
use crate::config::GhostConfig;

/// Same per-process scoping caveat as `status`: cancelling a task id from a
/// different process invocation always reports "not found" because nothing
/// was ever submitted against this scheduler instance.
pub async fn run(args: CancelArgs, config: GhostConfig) -> Result<()> {
    let ctx = AppContext::build(config);
    let task_id = TaskId::from(args.task_id.as_str());
    let cancelled = ctx.scheduler.cancel_task(&task_id);
    if cancelled {
        println!("cancelled {task_id}");
    } else {
        println!("task {task_id} was not running or not found");
    }
    Ok(())
}
