use std::sync::Arc;

/// Sink for upload queue metrics.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Current sizes of the waiting and running lists.
    fn queue_depth(&self, waiting: usize, running: usize);

    fn upload_admitted(&self);

    /// `outcome` is one of `"succeeded"`, `"failed"`, `"canceled"`.
    fn upload_finished(&self, outcome: &'static str);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Backend that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn queue_depth(&self, _waiting: usize, _running: usize) {}

    fn upload_admitted(&self) {}

    fn upload_finished(&self, _outcome: &'static str) {}
}
