use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{Task, TaskControl};
use crate::error::TaskError;

/// Task whose body is a closure returning a future.
///
/// ```rust
/// use pasta_core::{FnTask, TaskError};
///
/// let task = FnTask::arc("checksum", |token| async move {
///     if token.is_cancelled() {
///         return Err(TaskError::Canceled);
///     }
///     Ok(())
/// });
/// assert_eq!(pasta_core::Task::name(task.as_ref()), "checksum");
/// ```
pub struct FnTask<F> {
    name: String,
    control: TaskControl,
    body: F,
}

impl<F, Fut> FnTask<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            control: TaskControl::new(),
            body,
        }
    }

    pub fn arc(name: impl Into<String>, body: F) -> Arc<Self> {
        Arc::new(Self::new(name, body))
    }
}

#[async_trait]
impl<F, Fut> Task for FnTask<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn control(&self) -> &TaskControl {
        &self.control
    }

    async fn run(&self, token: CancellationToken) -> Result<(), TaskError> {
        (self.body)(token).await
    }
}
