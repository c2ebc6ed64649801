mod task_id;
pub use task_id::TaskId;

mod task_info;
pub use task_info::TaskInfo;

mod task_status;
pub use task_status::TaskStatus;

/// Human readable label of a task (file name of an upload, `"upload-queue"` for the manager).
pub type TaskName = String;
