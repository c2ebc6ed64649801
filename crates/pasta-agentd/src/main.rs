mod cli;
mod config;
mod ontology;
mod upload;

use clap::Parser;
use tracing::info;

use pasta_observe::logger_init;

use crate::{
    cli::{Cli, Command},
    config::AgentConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Arguments and config
    let cli = Cli::parse();
    let cfg = AgentConfig::from_cli(&cli)?;

    // 2) Logger
    logger_init(&cfg.logger)?;
    info!(home = %cfg.home.display(), "logger initialized");

    // 3) Dispatch
    match cli.command {
        Command::Upgrade => {
            ontology::upgrade(&cfg)?;
        }
        Command::Upload { files } => {
            let summary = upload::run(&cfg, files, None).await?;
            if summary.failed > 0 {
                anyhow::bail!("{} upload(s) failed", summary.failed);
            }
        }
    }

    info!("shutting down...");
    Ok(())
}
