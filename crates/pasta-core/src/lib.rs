pub mod error;
pub use error::{CoreError, TaskError, TaskOutcome};

pub mod task;
pub use task::{FnTask, Task, TaskControl, TaskRef};

pub mod thread;
pub use thread::TaskThread;

pub mod queue;
pub use queue::{
    ManagerBuilder, ManagerConfig, QueueEvent, QueueEventKind, QueueObserver, UploadQueueManager,
};

pub mod state;
pub use state::{StateSummary, UploadState};

pub mod config;
pub use config::{ConfigStore, JsonConfigStore, MemoryConfigStore};

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics};

pub mod extractor;
pub use extractor::{Extractor, ExtractorRouter};

mod sync;
