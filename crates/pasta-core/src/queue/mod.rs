//! Bounded-concurrency upload queue.
//!
//! The manager keeps a `waiting` and a `running` list of [`TaskThread`]
//! pairings. Its own body is the admission loop: every poll interval it moves
//! not-yet-started pairings from `waiting` to `running` until the concurrency
//! limit is reached, starting each one. A pairing whose body returns is removed
//! through its `finished` observer, which frees a slot for the next pass.
//!
//! Both lists live behind one mutex. Observers, task events and `quit()` are
//! always invoked after the lock is released, so a `finished` observer running
//! on a worker thread can re-enter [`UploadQueueManager::remove_from_queue`].
mod event;
pub use event::{QueueEvent, QueueEventKind, QueueObserver};

use std::{
    mem,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use pasta_model::{DEFAULT_PARALLEL_UPLOADS, TaskId, TaskStatus, UPLOAD_CONFIG_ID};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    ConfigStore, CoreError, MetricsHandle, NoopMetrics, Task, TaskControl, TaskError, TaskOutcome,
    TaskRef, TaskThread, UploadState, sync::lock,
};

/// Tunables of the manager itself (the concurrency limit comes from the config store).
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub name: String,
    /// Sleep between admission passes.
    pub poll_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: "upload-queue".to_string(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Default)]
struct Queues {
    waiting: Vec<Arc<TaskThread>>,
    running: Vec<Arc<TaskThread>>,
}

impl Queues {
    fn contains(&self, id: &TaskId) -> bool {
        self.waiting
            .iter()
            .chain(self.running.iter())
            .any(|p| p.id() == id)
    }

    #[inline]
    fn sizes(&self) -> (usize, usize) {
        (self.waiting.len(), self.running.len())
    }
}

pub struct ManagerBuilder {
    config_store: Arc<dyn ConfigStore>,
    cfg: ManagerConfig,
    metrics: MetricsHandle,
    observers: Vec<Arc<dyn QueueObserver>>,
}

impl ManagerBuilder {
    pub fn with_config(mut self, cfg: ManagerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.cfg.poll_interval = interval;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_observers(mut self, observers: Vec<Arc<dyn QueueObserver>>) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Build the manager and read the concurrency limit once.
    pub fn build(self) -> Arc<UploadQueueManager> {
        let manager = Arc::new_cyclic(|this| UploadQueueManager {
            name: self.cfg.name,
            control: TaskControl::new(),
            queues: Mutex::new(Queues::default()),
            limit: AtomicUsize::new(DEFAULT_PARALLEL_UPLOADS),
            poll_interval: self.cfg.poll_interval,
            config_store: self.config_store,
            metrics: self.metrics,
            observers: self.observers,
            state: UploadState::new(),
            this: this.clone(),
        });
        manager.set_concurrent_uploads();
        manager
    }
}

/// Upload queue manager; itself a [`Task`] whose body is the admission loop.
pub struct UploadQueueManager {
    name: String,
    control: TaskControl,
    queues: Mutex<Queues>,
    limit: AtomicUsize,
    poll_interval: Duration,
    config_store: Arc<dyn ConfigStore>,
    metrics: MetricsHandle,
    observers: Vec<Arc<dyn QueueObserver>>,
    state: UploadState,
    this: Weak<Self>,
}

impl UploadQueueManager {
    pub fn builder(config_store: Arc<dyn ConfigStore>) -> ManagerBuilder {
        ManagerBuilder {
            config_store,
            cfg: ManagerConfig::default(),
            metrics: Arc::new(NoopMetrics),
            observers: Vec::new(),
        }
    }

    pub fn new(config_store: Arc<dyn ConfigStore>) -> Arc<Self> {
        Self::builder(config_store).build()
    }

    /// Run the admission loop on a dedicated pairing and start it.
    pub fn spawn(self: &Arc<Self>) -> Result<Arc<TaskThread>, CoreError> {
        let task: TaskRef = Arc::clone(self) as TaskRef;
        let pairing = TaskThread::spawn(task)?;
        pairing.task().start();
        Ok(pairing)
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit.load(Ordering::Acquire)
    }

    #[inline]
    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Ids of the waiting pairings, in queue order.
    pub fn waiting(&self) -> Vec<TaskId> {
        lock(&self.queues)
            .waiting
            .iter()
            .map(|p| p.id().clone())
            .collect()
    }

    /// Ids of the running pairings, in admission order.
    pub fn running(&self) -> Vec<TaskId> {
        lock(&self.queues)
            .running
            .iter()
            .map(|p| p.id().clone())
            .collect()
    }

    pub fn is_queued(&self, id: &TaskId) -> bool {
        lock(&self.queues).contains(id)
    }

    /// Re-read the concurrency limit from the config store.
    ///
    /// A missing record, a missing field, zero, or a store error all fall back to one.
    pub fn set_concurrent_uploads(&self) -> usize {
        let limit = match self.config_store.load_upload_config() {
            Ok(Some(cfg)) => cfg.concurrency_limit(),
            Ok(None) => {
                warn!(record = UPLOAD_CONFIG_ID, "upload config missing; using default limit");
                DEFAULT_PARALLEL_UPLOADS
            }
            Err(e) => {
                warn!(
                    record = UPLOAD_CONFIG_ID,
                    error = %e,
                    "upload config unreadable; using default limit"
                );
                DEFAULT_PARALLEL_UPLOADS
            }
        };

        let previous = self.limit.swap(limit, Ordering::AcqRel);
        if previous != limit {
            debug!(previous, limit, "concurrency limit changed");
        }
        let (waiting, running) = lock(&self.queues).sizes();
        self.emit(
            QueueEvent::new(QueueEventKind::LimitChanged, waiting, running)
                .with_reason(limit.to_string()),
        );
        limit
    }

    /// Append `pairing` to the waiting list.
    ///
    /// Returns `false` and leaves the queue untouched if a pairing with the same
    /// id is already waiting or running.
    #[instrument(level = "debug", skip(self, pairing), fields(id = %pairing.id(), task = pairing.name()))]
    pub fn add_to_queue(&self, pairing: Arc<TaskThread>) -> bool {
        let added = {
            let mut q = lock(&self.queues);
            if q.contains(pairing.id()) {
                Err(q.sizes())
            } else {
                self.state.add(pairing.id().clone(), pairing.name());
                self.watch(&pairing);
                q.waiting.push(Arc::clone(&pairing));
                Ok(q.sizes())
            }
        };

        match added {
            Ok((waiting, running)) => {
                debug!(waiting, running, "pairing queued");
                self.metrics.queue_depth(waiting, running);
                self.emit(
                    QueueEvent::new(QueueEventKind::Queued, waiting, running)
                        .with_task(pairing.id(), pairing.name()),
                );
                true
            }
            Err((waiting, running)) => {
                warn!("pairing already queued; ignoring");
                self.emit(
                    QueueEvent::new(QueueEventKind::DuplicateRejected, waiting, running)
                        .with_task(pairing.id(), pairing.name()),
                );
                false
            }
        }
    }

    /// Drop `pairing` from both lists and quit it.
    ///
    /// `quit()` runs even when the pairing was in neither list.
    #[instrument(level = "debug", skip(self, pairing), fields(id = %pairing.id(), task = pairing.name()))]
    pub fn remove_from_queue(&self, pairing: &Arc<TaskThread>) {
        let id = pairing.id();
        let (was_queued, waiting, running) = {
            let mut q = lock(&self.queues);
            let before = q.sizes();
            q.waiting.retain(|p| p.id() != id);
            q.running.retain(|p| p.id() != id);
            let after = q.sizes();
            (before != after, after.0, after.1)
        };

        if was_queued {
            // No-op when the body already reported its outcome.
            self.state.update_status(id, TaskStatus::Canceled, None);
        }
        pairing.quit();

        if was_queued {
            debug!(waiting, running, "pairing removed");
            self.metrics.queue_depth(waiting, running);
            self.emit(
                QueueEvent::new(QueueEventKind::Removed, waiting, running)
                    .with_task(id, pairing.name()),
            );
        } else {
            trace!("pairing was not queued; quit only");
        }
    }

    /// One admission pass. Returns how many pairings were started.
    pub fn admit_pending(&self) -> usize {
        let limit = self.limit();
        let (admitted, waiting, running) = {
            let mut q = lock(&self.queues);
            let mut admitted = Vec::new();
            let mut i = 0;
            while q.running.len() < limit && i < q.waiting.len() {
                if q.waiting[i].task().control().is_started() {
                    i += 1;
                    continue;
                }
                let pairing = q.waiting.remove(i);
                self.state
                    .update_status(pairing.id(), TaskStatus::Running, None);
                q.running.push(Arc::clone(&pairing));
                admitted.push(pairing);
            }
            let (waiting, running) = q.sizes();
            (admitted, waiting, running)
        };

        for pairing in &admitted {
            debug!(id = %pairing.id(), task = pairing.name(), "admitting pairing");
            pairing.task().start();
            self.metrics.upload_admitted();
            self.emit(
                QueueEvent::new(QueueEventKind::Admitted, waiting, running)
                    .with_task(pairing.id(), pairing.name()),
            );
        }
        if !admitted.is_empty() {
            self.metrics.queue_depth(waiting, running);
        }
        admitted.len()
    }

    /// Cancel the manager, signal cancel to every running pairing, then quit
    /// and drop every pairing still in either list.
    #[instrument(level = "info", skip(self), fields(manager = %self.name))]
    pub fn cancel_task(&self) {
        self.control.cancel();

        let (running, waiting) = {
            let mut q = lock(&self.queues);
            (mem::take(&mut q.running), mem::take(&mut q.waiting))
        };

        for pairing in &running {
            pairing.task().cancel();
        }
        for pairing in running.iter().chain(waiting.iter()) {
            self.state
                .update_status(pairing.id(), TaskStatus::Canceled, None);
            pairing.quit();
        }

        info!(
            running = running.len(),
            waiting = waiting.len(),
            "upload queue cancelled"
        );
        self.metrics.queue_depth(0, 0);
        self.emit(QueueEvent::new(QueueEventKind::Cancelled, 0, 0));
    }

    fn watch(&self, pairing: &Arc<TaskThread>) {
        let manager = Weak::clone(&self.this);
        let weak = Arc::downgrade(pairing);
        let id = pairing.id().clone();

        pairing.task().control().on_finished(move |outcome| {
            let Some(manager) = manager.upgrade() else {
                return;
            };
            manager.record_outcome(&id, outcome);
            if let Some(pairing) = weak.upgrade() {
                manager.remove_from_queue(&pairing);
            }
        });
    }

    fn record_outcome(&self, id: &TaskId, outcome: &TaskOutcome) {
        let (status, label, error) = match outcome {
            Ok(()) => (TaskStatus::Succeeded, "succeeded", None),
            Err(TaskError::Canceled) => (TaskStatus::Canceled, "canceled", None),
            Err(e @ TaskError::Fail { .. }) => (TaskStatus::Failed, "failed", Some(e.to_string())),
        };
        let name = self.state.get(id).map(|info| info.name).unwrap_or_default();
        self.state.update_status(id, status, error.clone());
        self.metrics.upload_finished(label);

        let (waiting, running) = lock(&self.queues).sizes();
        let mut event =
            QueueEvent::new(QueueEventKind::Finished, waiting, running).with_task(id, &name);
        if let Some(reason) = error {
            event = event.with_reason(reason);
        }
        self.emit(event);
    }

    fn emit(&self, event: QueueEvent) {
        for observer in &self.observers {
            trace!(observer = observer.name(), kind = ?event.kind, "dispatching queue event");
            observer.on_event(&event);
        }
    }
}

#[async_trait]
impl Task for UploadQueueManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn control(&self) -> &TaskControl {
        &self.control
    }

    async fn run(&self, token: CancellationToken) -> Result<(), TaskError> {
        info!(
            limit = self.limit(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "admission loop started"
        );
        let (waiting, running) = lock(&self.queues).sizes();
        self.emit(QueueEvent::new(QueueEventKind::LoopStarted, waiting, running));

        while !self.control.is_cancelled() {
            self.admit_pending();
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("admission loop stopped");
        let (waiting, running) = lock(&self.queues).sizes();
        self.emit(QueueEvent::new(QueueEventKind::LoopStopped, waiting, running));
        Err(TaskError::Canceled)
    }

    fn cancel(&self) {
        self.cancel_task();
    }

    /// Base cleanup, then quit every pairing still waiting.
    fn cleanup(&self) {
        self.control.mark_cleaned();

        let waiting = mem::take(&mut lock(&self.queues).waiting);
        for pairing in &waiting {
            self.state
                .update_status(pairing.id(), TaskStatus::Canceled, None);
            pairing.quit();
        }
        let (waiting_now, running) = lock(&self.queues).sizes();
        self.metrics.queue_depth(waiting_now, running);
        debug!(dropped = waiting.len(), "upload queue cleaned up");
    }
}
