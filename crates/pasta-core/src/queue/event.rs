use pasta_model::TaskId;

/// What happened inside the upload queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEventKind {
    /// Pairing appended to the waiting list.
    Queued,
    /// Pairing already queued; the add was ignored.
    DuplicateRejected,
    /// Pairing moved from waiting to running and started.
    Admitted,
    /// Task body returned.
    Finished,
    /// Pairing removed and quit.
    Removed,
    /// Manager cancelled; every pairing was quit.
    Cancelled,
    /// Concurrency limit (re)read from configuration.
    LimitChanged,
    /// Admission loop started.
    LoopStarted,
    /// Admission loop observed cancellation and exited.
    LoopStopped,
}

/// One queue notification, with list sizes taken right after the change.
#[derive(Debug, Clone)]
pub struct QueueEvent {
    pub kind: QueueEventKind,
    pub task: Option<TaskId>,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub waiting: usize,
    pub running: usize,
}

impl QueueEvent {
    pub fn new(kind: QueueEventKind, waiting: usize, running: usize) -> Self {
        Self {
            kind,
            task: None,
            name: None,
            reason: None,
            waiting,
            running,
        }
    }

    pub fn with_task(mut self, id: &TaskId, name: &str) -> Self {
        self.task = Some(id.clone());
        self.name = Some(name.to_string());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Receives queue events synchronously on the thread that caused them.
///
/// Called outside the queue lock; implementations may call back into the manager.
pub trait QueueObserver: Send + Sync + 'static {
    fn on_event(&self, event: &QueueEvent);

    fn name(&self) -> &'static str;
}
