use clap::Parser;
use tracing::{error, Level};

mod cli;
mod commands;
mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = commands::run_command(cli).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "snapmig failed");
    }
    result
}
