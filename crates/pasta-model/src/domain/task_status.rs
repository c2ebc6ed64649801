use serde::{Deserialize, Serialize};

/// Where a pairing currently is from the upload queue's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Sitting in the waiting list.
    Pending,
    /// Admitted into the running list and started.
    Running,
    /// Body returned `Ok`.
    Succeeded,
    /// Body returned an error.
    Failed,
    /// Body observed cancellation and stopped.
    Canceled,
}

impl TaskStatus {
    /// Returns `true` once the body has returned (any outcome).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled
        )
    }

    /// Returns `true` while the task is still queued or running.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Canceled.is_terminal());

        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn active_states() {
        assert!(TaskStatus::Pending.is_active());
        assert!(TaskStatus::Running.is_active());
        assert!(!TaskStatus::Canceled.is_active());
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&TaskStatus::Canceled).unwrap();
        assert_eq!(json, r#""canceled""#);

        let back: TaskStatus = serde_json::from_str(r#""running""#).unwrap();
        assert_eq!(back, TaskStatus::Running);
    }
}
