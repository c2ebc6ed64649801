use thiserror::Error;

/// Failures while installing the global logger.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("PASTA_LOG_FORMAT: unknown format `{0}` (use text, json or journald)")]
    InvalidFormat(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global logger is already installed")]
    AlreadyInitialized,
    #[error("logger setup failed: {0}")]
    InitializationFailed(String),
    #[error("PASTA_LOG_LEVEL: invalid filter `{0}`")]
    InvalidLogLevel(String),
}
