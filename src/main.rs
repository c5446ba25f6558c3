mod app;
mod cli;
mod config;
mod intent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::app::run().await
}
