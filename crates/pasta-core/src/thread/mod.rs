//! Task/thread pairing: one task bound to one dedicated OS thread.
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    thread::{self, JoinHandle},
};

use pasta_model::TaskId;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, instrument, trace, warn};

use crate::{CoreError, TaskRef, sync::lock};

enum Signal {
    Start,
    Stop,
}

/// Owns one task and the worker thread that executes it.
///
/// The thread is started on construction and parks until the task's `start`
/// event fires; it then runs the body on its own current-thread runtime and
/// reports the outcome through the task's `finished` observers.
pub struct TaskThread {
    id: TaskId,
    task: TaskRef,
    tx: Mutex<Sender<Signal>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    quit: AtomicBool,
    stop_requested: AtomicBool,
}

impl TaskThread {
    /// Create the worker thread for `task` and start it.
    #[instrument(level = "debug", skip(task), fields(task = task.name()))]
    pub fn spawn(task: TaskRef) -> Result<Arc<Self>, CoreError> {
        let id = TaskId::generate();
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| CoreError::ThreadSpawn(format!("runtime: {e}")))?;

        let (tx, rx) = mpsc::channel();
        let worker_task = Arc::clone(&task);
        let handle = thread::Builder::new()
            .name(format!("pasta-task-{}", task.name()))
            .spawn(move || worker_loop(worker_task, runtime, rx))
            .map_err(|e| CoreError::ThreadSpawn(e.to_string()))?;

        let wake = tx.clone();
        task.control().on_start(move || {
            // The worker may already be gone after quit; nothing left to wake then.
            let _ = wake.send(Signal::Start);
        });

        debug!(%id, "worker thread started");
        Ok(Arc::new(Self {
            id,
            task,
            tx: Mutex::new(tx),
            handle: Mutex::new(Some(handle)),
            quit: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        }))
    }

    #[inline]
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    #[inline]
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns `true` once [`TaskThread::quit`] has run.
    pub fn is_quit(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    /// Returns `true` once the worker thread has been asked to stop.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Cancel the task, clean it up, then ask the thread to stop.
    ///
    /// Runs at most once per pairing; later calls are no-ops. Does not wait for
    /// the thread, so it is safe to call from the task's own `finished` observer.
    pub fn quit(&self) {
        if self.quit.swap(true, Ordering::AcqRel) {
            trace!(id = %self.id, "quit already requested");
            return;
        }
        self.task.cancel();
        self.task.cleanup();
        self.request_stop();
        debug!(id = %self.id, task = self.task.name(), "pairing quit");
    }

    /// Wait for the worker thread to exit. No-op when called from the worker itself.
    pub fn join(&self) {
        let handle = lock(&self.handle).take();
        let Some(handle) = handle else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            *lock(&self.handle) = Some(handle);
            return;
        }
        if handle.join().is_err() {
            warn!(id = %self.id, "worker thread panicked");
        }
    }

    fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        let _ = lock(&self.tx).send(Signal::Stop);
    }
}

impl Drop for TaskThread {
    fn drop(&mut self) {
        // The start observer keeps a sender alive inside the task, so the
        // channel never closes on its own.
        self.request_stop();
    }
}

fn worker_loop(task: TaskRef, runtime: Runtime, rx: Receiver<Signal>) {
    while let Ok(signal) = rx.recv() {
        match signal {
            Signal::Start => {
                let token = task.control().token();
                trace!(task = task.name(), "running task body");
                let outcome = runtime.block_on(task.run(token));
                match &outcome {
                    Ok(()) => debug!(task = task.name(), "task body finished"),
                    Err(e) => debug!(task = task.name(), reason = %e, "task body stopped"),
                }
                task.control().finish(&outcome);
            }
            Signal::Stop => break,
        }
    }
    trace!(task = task.name(), "worker thread exiting");
}
