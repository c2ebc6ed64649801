use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::{TaskId, TaskName, TaskStatus};

/// Snapshot of one pairing known to the upload queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: TaskName,
    pub status: TaskStatus,
    /// When the pairing entered the queue.
    #[serde(with = "time_serde")]
    pub queued_at: SystemTime,
    /// Last status change.
    #[serde(with = "time_serde")]
    pub updated_at: SystemTime,
    /// Failure reason when `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskInfo {
    pub fn pending(id: TaskId, name: impl Into<TaskName>) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            name: name.into(),
            status: TaskStatus::Pending,
            queued_at: now,
            updated_at: now,
            error: None,
        }
    }
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?
            .as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_info_has_no_error() {
        let info = TaskInfo::pending(TaskId::from("t-1"), "scan.csv");
        assert_eq!(info.status, TaskStatus::Pending);
        assert_eq!(info.name, "scan.csv");

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"queuedAt\""));
    }

    #[test]
    fn timestamps_survive_serde_at_millisecond_precision() {
        let mut info = TaskInfo::pending(TaskId::from("t-2"), "image.tif");
        info.status = TaskStatus::Failed;
        info.error = Some("connection reset".into());

        let json = serde_json::to_string(&info).unwrap();
        let back: TaskInfo = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, info.id);
        assert_eq!(back.status, TaskStatus::Failed);
        assert_eq!(back.error.as_deref(), Some("connection reset"));
        let drift = info
            .queued_at
            .duration_since(back.queued_at)
            .unwrap_or_default();
        assert!(drift.as_millis() < 1);
    }
}
