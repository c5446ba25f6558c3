use clap::{Parser, Subcommand};

/// Command-line entrypoint for submitting and inspecting browser-automation
/// tasks against an in-process orchestrator.
#[derive(Debug, Parser)]
#[command(name = "ghost-tabs", version, about = "Autonomous browser-tab orchestrator")]
pub struct CliArgs {
    /// Emit logs as JSON instead of the default compact format.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit a new task and stream its status until it reaches a terminal outcome.
    Submit(SubmitArgs),
    /// Look up a task's status by id within this process.
    Status(StatusArgs),
    /// Cancel a running task by id within this process.
    Cancel(CancelArgs),
    /// Run a small scripted task against the in-memory fakes, end to end.
    RunDemo(RunDemoArgs),
}

#[derive(Debug, clap::Args)]
pub struct SubmitArgs {
    /// Natural-language description of what the task should accomplish.
    pub intent: String,
    /// URL to start navigation from, if any.
    #[arg(long)]
    pub start_url: Option<String>,
    /// Explicit mode override; bypasses the keyword-based intent classifier.
    #[arg(long)]
    pub mode: Option<String>,
    /// Run at background priority instead of foreground.
    #[arg(long)]
    pub background: bool,
    #[arg(long)]
    pub max_steps: Option<u32>,
    #[arg(long)]
    pub max_retries: Option<u32>,
}

#[derive(Debug, clap::Args)]
pub struct StatusArgs {
    pub task_id: String,
}

#[derive(Debug, clap::Args)]
pub struct CancelArgs {
    pub task_id: String,
}

#[derive(Debug, clap::Args)]
pub struct RunDemoArgs {
    /// Skip streaming intermediate status and only print the final outcome.
    #[arg(long)]
    pub quiet: bool,
}
