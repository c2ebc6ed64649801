use std::borrow::Borrow;

use pasta_core::{QueueEvent, QueueEventKind};
use tracing::{debug, error, info, trace, warn};

pub trait View {
    fn as_task(&self) -> &str;
    fn as_id(&self) -> &str;
    fn as_reason(&self) -> &str;
    fn waiting(&self) -> usize;
    fn running(&self) -> usize;
    fn kind(&self) -> QueueEventKind;
    fn has_reason(&self) -> bool;
}

impl<T> View for T
where
    T: Borrow<QueueEvent>,
{
    #[inline]
    fn as_task(&self) -> &str {
        self.borrow().name.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn as_id(&self) -> &str {
        self.borrow().task.as_ref().map(|id| id.as_str()).unwrap_or("-")
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn waiting(&self) -> usize {
        self.borrow().waiting
    }
    #[inline]
    fn running(&self) -> usize {
        self.borrow().running
    }
    #[inline]
    fn kind(&self) -> QueueEventKind {
        self.borrow().kind
    }
    #[inline]
    fn has_reason(&self) -> bool {
        self.borrow().reason.is_some()
    }
}

#[inline]
pub fn message_for(kind: QueueEventKind) -> &'static str {
    match kind {
        // membership
        QueueEventKind::Queued => "upload queued",
        QueueEventKind::DuplicateRejected => "upload already queued; ignored",
        QueueEventKind::Removed => "upload removed from queue (thread quit)",

        // lifecycle
        QueueEventKind::Admitted => "upload admitted and started",
        QueueEventKind::Finished => "upload finished",

        // manager
        QueueEventKind::Cancelled => "upload queue cancelled; all uploads quit",
        QueueEventKind::LimitChanged => "parallel upload limit loaded",
        QueueEventKind::LoopStarted => "admission loop started",
        QueueEventKind::LoopStopped => "admission loop stopped",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        // membership
        QueueEventKind::Queued => debug!(
            task = e.as_task(),
            id = e.as_id(),
            waiting = e.waiting(),
            "{msg}"
        ),
        QueueEventKind::DuplicateRejected => warn!(task = e.as_task(), id = e.as_id(), "{msg}"),
        QueueEventKind::Removed => trace!(task = e.as_task(), id = e.as_id(), "{msg}"),

        // lifecycle
        QueueEventKind::Admitted => info!(
            task = e.as_task(),
            id = e.as_id(),
            waiting = e.waiting(),
            running = e.running(),
            "{msg}"
        ),
        QueueEventKind::Finished => {
            if e.has_reason() {
                error!(
                    task = e.as_task(),
                    id = e.as_id(),
                    reason = e.as_reason(),
                    "upload failed"
                );
            } else {
                info!(task = e.as_task(), id = e.as_id(), "{msg}");
            }
        }

        // manager
        QueueEventKind::Cancelled => info!("{msg}"),
        QueueEventKind::LimitChanged => debug!(limit = e.as_reason(), "{msg}"),
        QueueEventKind::LoopStarted => debug!(waiting = e.waiting(), "{msg}"),
        QueueEventKind::LoopStopped => debug!(
            waiting = e.waiting(),
            running = e.running(),
            "{msg}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pasta_model::TaskId;

    #[test]
    fn view_defaults_for_bare_events() {
        let event = QueueEvent::new(QueueEventKind::LoopStarted, 3, 0);
        assert_eq!(event.as_task(), "unknown");
        assert_eq!(event.as_id(), "-");
        assert!(!event.has_reason());
        assert_eq!(event.waiting(), 3);
    }

    #[test]
    fn view_reads_task_and_reason() {
        let id = TaskId::from("t-1");
        let event = QueueEvent::new(QueueEventKind::Finished, 0, 1)
            .with_task(&id, "upload a.txt")
            .with_reason("task failed: disk full");
        let by_ref = &event;
        assert_eq!(by_ref.as_task(), "upload a.txt");
        assert_eq!(by_ref.as_id(), "t-1");
        assert_eq!(by_ref.as_reason(), "task failed: disk full");
        assert_eq!(by_ref.kind(), QueueEventKind::Finished);
        log_event(by_ref);
    }

    #[test]
    fn every_kind_has_a_message() {
        let kinds = [
            QueueEventKind::Queued,
            QueueEventKind::DuplicateRejected,
            QueueEventKind::Admitted,
            QueueEventKind::Finished,
            QueueEventKind::Removed,
            QueueEventKind::Cancelled,
            QueueEventKind::LimitChanged,
            QueueEventKind::LoopStarted,
            QueueEventKind::LoopStopped,
        ];
        for kind in kinds {
            assert!(!message_for(kind).is_empty());
        }
    }
}
