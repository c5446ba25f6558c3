use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use crate::cli::dispatch::dispatch;
use crate::cli::env::CliArgs;
use crate::cli::runtime::init_logging;
use crate::config::GhostConfig;

/// Thin entrypoint: parse args, wire logging, load config, dispatch, log
/// the outcome. Mirrors the shape of a typical CLI's top-level `run()` --
/// all the actual work happens in the per-command handlers.
pub async fn run() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs)?;

    let config = GhostConfig::from_env()?;
    info!(?config, "loaded configuration");

    match dispatch(args.command, config).await {
        Ok(()) => {
            info!("command completed");
            Ok(())
        }
        Err(err) => {
            error!(?err, "command failed");
            Err(err)
        }
    }
}
