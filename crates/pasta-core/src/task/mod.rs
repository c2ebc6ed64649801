//! Generic cancellable unit of work.
//!
//! A task carries three independent flags (`started`, `cancelled`, `cleaned`)
//! in a [`TaskControl`] and exposes the `start`, `cancel` and `cleanup` events.
//! Observers registered on the control replace toolkit signals: the pairing
//! thread listens to `start`, the upload queue listens to `finished`.
//!
//! Cancellation is cooperative. The body receives a [`CancellationToken`] and
//! decides itself when to stop.
mod fn_task;
pub use fn_task::FnTask;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{TaskOutcome, error::TaskError, sync::lock};

type Observer = Arc<dyn Fn() + Send + Sync>;
type FinishedObserver = Arc<dyn Fn(&TaskOutcome) + Send + Sync>;

/// Shared handle to any task.
pub type TaskRef = Arc<dyn Task>;

/// Cancellable unit of work bound to a worker thread by [`crate::TaskThread`].
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Label used in logs and in the upload registry.
    fn name(&self) -> &str;

    fn control(&self) -> &TaskControl;

    /// Body executed on the pairing's thread after `start`.
    async fn run(&self, token: CancellationToken) -> Result<(), TaskError>;

    fn start(&self) {
        self.control().start();
    }

    fn cancel(&self) {
        self.control().cancel();
    }

    /// Release resources held by the task. Overrides must still call
    /// `self.control().mark_cleaned()`.
    fn cleanup(&self) {
        self.control().mark_cleaned();
    }
}

/// Flags and observers of one task.
pub struct TaskControl {
    started: AtomicBool,
    cancelled: AtomicBool,
    cleaned: AtomicBool,
    token: Mutex<CancellationToken>,
    on_start: Mutex<Vec<Observer>>,
    on_cancel: Mutex<Vec<Observer>>,
    on_finished: Mutex<Vec<FinishedObserver>>,
}

impl TaskControl {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            cleaned: AtomicBool::new(false),
            token: Mutex::new(CancellationToken::new()),
            on_start: Mutex::new(Vec::new()),
            on_cancel: Mutex::new(Vec::new()),
            on_finished: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_cleaned(&self) -> bool {
        self.cleaned.load(Ordering::Acquire)
    }

    /// Token for the next (or current) run of the body.
    pub fn token(&self) -> CancellationToken {
        lock(&self.token).clone()
    }

    /// `started = true`, `cancelled = false`, then notify start observers.
    pub fn start(&self) {
        {
            // A tripped token cannot be reset, so a restart gets a fresh one.
            let mut token = lock(&self.token);
            if token.is_cancelled() {
                *token = CancellationToken::new();
            }
        }
        self.cancelled.store(false, Ordering::Release);
        self.started.store(true, Ordering::Release);

        let observers = lock(&self.on_start).clone();
        for observer in observers {
            observer();
        }
    }

    /// `cancelled = true`. Observers only fire on the first transition.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        lock(&self.token).cancel();

        let observers = lock(&self.on_cancel).clone();
        for observer in observers {
            observer();
        }
    }

    pub fn mark_cleaned(&self) {
        self.cleaned.store(true, Ordering::Release);
    }

    /// Report that the body returned.
    pub fn finish(&self, outcome: &TaskOutcome) {
        let observers = lock(&self.on_finished).clone();
        for observer in observers {
            observer(outcome);
        }
    }

    pub fn on_start(&self, f: impl Fn() + Send + Sync + 'static) {
        lock(&self.on_start).push(Arc::new(f));
    }

    pub fn on_cancel(&self, f: impl Fn() + Send + Sync + 'static) {
        lock(&self.on_cancel).push(Arc::new(f));
    }

    pub fn on_finished(&self, f: impl Fn(&TaskOutcome) + Send + Sync + 'static) {
        lock(&self.on_finished).push(Arc::new(f));
    }
}

impl Default for TaskControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn new_control_is_idle() {
        let c = TaskControl::new();
        assert!(!c.is_started());
        assert!(!c.is_cancelled());
        assert!(!c.is_cleaned());
    }

    #[test]
    fn cancel_does_not_clear_started() {
        let c = TaskControl::new();
        c.start();
        c.cancel();
        assert!(c.is_started());
        assert!(c.is_cancelled());
    }

    #[test]
    fn start_resets_cancelled_and_token() {
        let c = TaskControl::new();
        c.cancel();
        assert!(c.token().is_cancelled());

        c.start();
        assert!(!c.is_cancelled());
        assert!(!c.token().is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent_and_fires_once() {
        let c = TaskControl::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        c.on_cancel(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        let token = c.token();
        c.cancel();
        c.cancel();

        assert!(c.is_cancelled());
        assert!(token.is_cancelled());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cleanup_flag_is_sticky() {
        let c = TaskControl::new();
        c.mark_cleaned();
        c.mark_cleaned();
        assert!(c.is_cleaned());
    }

    #[test]
    fn start_and_finished_observers_fire() {
        let c = TaskControl::new();
        let started = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&started);
        c.on_start(move || {
            s.fetch_add(1, Ordering::SeqCst);
        });
        let f = Arc::clone(&failed);
        c.on_finished(move |outcome| {
            if outcome.is_err() {
                f.fetch_add(1, Ordering::SeqCst);
            }
        });

        c.start();
        c.finish(&Err(TaskError::fail("boom")));
        c.finish(&Ok(()));

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }
}
