use std::path::PathBuf;

use pasta_observe::{LoggerConfig, LoggerError};

use crate::cli::Cli;

/// Resolved daemon settings.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub logger: LoggerConfig,
    /// Root holding `config.json`, `docs/` and `outbox/`.
    pub home: PathBuf,
}

impl AgentConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, LoggerError> {
        let logger = LoggerConfig::with_overrides(Some(&cli.log_level), Some(&cli.log_format))?;
        Ok(Self {
            logger,
            home: cli.home.clone(),
        })
    }

    /// Defaults rooted at `home`.
    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self {
            logger: LoggerConfig::default(),
            home: home.into(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.json")
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.home.join("docs")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.home.join("outbox")
    }
}
