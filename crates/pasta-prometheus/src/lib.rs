//! Prometheus metrics backend for the upload queue.
//!
//! [`PrometheusMetrics`] implements [`pasta_core::MetricsBackend`] on its own
//! [`Registry`]; hand it to the manager builder and expose
//! [`PrometheusMetrics::gather`] through whatever endpoint the host has.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pasta_core::{MemoryConfigStore, UploadQueueManager};
//! use pasta_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let store = Arc::new(MemoryConfigStore::with_parallel_uploads(2));
//! let manager = UploadQueueManager::builder(store)
//!     .with_metrics(Arc::new(metrics.clone()))
//!     .build();
//! # let _ = manager;
//!
//! let mut buffer = Vec::new();
//! TextEncoder::new().encode(&metrics.gather(), &mut buffer)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `pasta_upload_queue_waiting` - Gauge
//! - `pasta_upload_queue_running` - Gauge
//! - `pasta_uploads_admitted_total` - Counter
//! - `pasta_uploads_finished_total{outcome}` - Counter

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
