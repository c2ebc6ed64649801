use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to start worker thread: {0}")]
    ThreadSpawn(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("malformed record {id}: {reason}")]
    Malformed { id: String, reason: String },
    #[error("no extractor for {0}")]
    NoExtractor(String),
    #[error("extractor {name} failed: {reason}")]
    Extract { name: String, reason: String },
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

/// Why a task body stopped without success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task failed: {reason}")]
    Fail { reason: String },
    #[error("cancelled")]
    Canceled,
}

impl TaskError {
    pub fn fail(reason: impl Into<String>) -> Self {
        TaskError::Fail {
            reason: reason.into(),
        }
    }
}

/// What a task body returned; handed to `finished` observers.
pub type TaskOutcome = Result<(), TaskError>;
