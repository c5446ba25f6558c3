use anyhow::Result;
use ghost_core_types::TaskId;

use crate::app::AppContext;
use crate::cli::env::StatusArgs;
use crate::config::GhostConfig;

/// Looks up a task's status against a freshly built scheduler. Task state
/// lives only in the process that submitted it -- there is no durable
/// cross-process store -- so this only finds tasks submitted earlier in
/// the same run, e.g. via a supervising process that holds the same
/// `AppContext`. Run standalone it reports `task not found`, which is the
/// correct answer for a process with no history to query.
pub async fn run(args: StatusArgs, config: GhostConfig) -> Result<()> {
    let ctx = AppContext::build(config);
    let task_id = TaskId::from(args.task_id.as_str());
    let status = ctx.scheduler.status(&task_id)?;
    println!("state={:?} outcome={:?} attempt={}", status.state, status.outcome, status.attempt);
    Ok(())
}
