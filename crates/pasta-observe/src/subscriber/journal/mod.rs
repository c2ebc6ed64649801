use pasta_core::{QueueEvent, QueueObserver};

use crate::subscriber::view::log_event;

/// Writes every queue event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct Journal;

impl Journal {
    pub fn new() -> Self {
        Self
    }
}

impl QueueObserver for Journal {
    fn on_event(&self, event: &QueueEvent) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}
