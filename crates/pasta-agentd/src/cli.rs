use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pasta-agentd")]
#[command(version, about = "PASTA upload queue and data hierarchy maintenance", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Data root holding config.json, docs/ and outbox/
    #[arg(long, global = true, env = "PASTA_HOME", default_value = ".pasta")]
    pub home: PathBuf,

    /// Log filter directives (e.g. `info` or `pasta_core=debug,warn`)
    #[arg(long, global = true, env = "PASTA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output: text, json or journald
    #[arg(long, global = true, env = "PASTA_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Upgrade the stored data hierarchy to version 3
    Upgrade,

    /// Copy files to the outbox through the upload queue
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
