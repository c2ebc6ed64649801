use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::SystemTime,
};

use pasta_model::{TaskId, TaskInfo, TaskStatus};

use crate::sync::{read, write};

/// Status registry of every pairing the upload queue has seen.
///
/// Finished entries stay until [`UploadState::clear_finished`] so a front end
/// can show the outcome of completed uploads; whoever owns the manager prunes
/// them once the outcomes have been read.
#[derive(Clone)]
pub struct UploadState {
    inner: Arc<RwLock<UploadStateInner>>,
}

struct UploadStateInner {
    tasks: HashMap<TaskId, TaskInfo>,
    /// Insertion order of `tasks`.
    order: Vec<TaskId>,
}

/// Entry counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSummary {
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub canceled: usize,
}

impl UploadState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(UploadStateInner {
                tasks: HashMap::new(),
                order: Vec::new(),
            })),
        }
    }

    /// Register a queued pairing as `Pending`. Re-adding a known id resets it.
    pub fn add(&self, id: TaskId, name: &str) {
        let mut inner = write(&self.inner);
        if inner
            .tasks
            .insert(id.clone(), TaskInfo::pending(id.clone(), name))
            .is_none()
        {
            inner.order.push(id);
        }
    }

    /// Set a new status. Terminal states are final and never overwritten.
    pub fn update_status(&self, id: &TaskId, status: TaskStatus, error: Option<String>) -> bool {
        let mut inner = write(&self.inner);
        match inner.tasks.get_mut(id) {
            Some(info) if !info.status.is_terminal() => {
                info.status = status;
                info.updated_at = SystemTime::now();
                if error.is_some() {
                    info.error = error;
                }
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, id: &TaskId) -> Option<TaskInfo> {
        let mut inner = write(&self.inner);
        let info = inner.tasks.remove(id)?;
        inner.order.retain(|known| known != id);
        Some(info)
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskInfo> {
        read(&self.inner).tasks.get(id).cloned()
    }

    /// All entries in the order they were queued.
    pub fn list(&self) -> Vec<TaskInfo> {
        let inner = read(&self.inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect()
    }

    pub fn list_by_status(&self, status: TaskStatus) -> Vec<TaskInfo> {
        let inner = read(&self.inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|info| info.status == status)
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> StateSummary {
        let inner = read(&self.inner);
        inner
            .tasks
            .values()
            .fold(StateSummary::default(), |mut acc, info| {
                match info.status {
                    TaskStatus::Pending => acc.pending += 1,
                    TaskStatus::Running => acc.running += 1,
                    TaskStatus::Succeeded => acc.succeeded += 1,
                    TaskStatus::Failed => acc.failed += 1,
                    TaskStatus::Canceled => acc.canceled += 1,
                }
                acc
            })
    }

    /// Drop every terminal entry; returns how many were dropped.
    pub fn clear_finished(&self) -> usize {
        let mut inner = write(&self.inner);
        let before = inner.tasks.len();
        inner.tasks.retain(|_, info| !info.status.is_terminal());
        let UploadStateInner { tasks, order } = &mut *inner;
        order.retain(|id| tasks.contains_key(id));
        before - tasks.len()
    }
}

impl Default for UploadState {
    fn default() -> Self {
        Self::new()
    }
}
