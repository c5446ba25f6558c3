use anyhow::Result;

use crate::cli::env::Commands;
use crate::cli::{cancel, demo, status, submit};
use crate::config::GhostConfig;

pub async fn dispatch(command: Commands, config: GhostConfig) -> Result<()> {
    match command {
        Commands::Submit(args) => submit::run(args, config).await,
        Commands::Status(args) => status::run(args, config).await,
        Commands::Cancel(args) => cancel::run(args, config).await,
        Commands::RunDemo(args) => demo::run(args, config).await,
    }
}
