use pasta_core::MetricsBackend;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, proto::MetricFamily};

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    waiting: IntGauge,
    running: IntGauge,
    admitted: IntCounter,
    finished: IntCounterVec,
}

impl PrometheusMetrics {
    /// Backend with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register the upload metrics on an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let waiting = IntGauge::with_opts(Opts::new(
            "pasta_upload_queue_waiting",
            "Uploads waiting for a free slot",
        ))?;
        let running = IntGauge::with_opts(Opts::new(
            "pasta_upload_queue_running",
            "Uploads currently running",
        ))?;
        let admitted = IntCounter::with_opts(Opts::new(
            "pasta_uploads_admitted_total",
            "Uploads moved from waiting to running",
        ))?;
        let finished = IntCounterVec::new(
            Opts::new("pasta_uploads_finished_total", "Uploads whose body returned"),
            &["outcome"],
        )?;

        registry.register(Box::new(waiting.clone()))?;
        registry.register(Box::new(running.clone()))?;
        registry.register(Box::new(admitted.clone()))?;
        registry.register(Box::new(finished.clone()))?;

        Ok(Self {
            registry,
            waiting,
            running,
            admitted,
            finished,
        })
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn queue_depth(&self, waiting: usize, running: usize) {
        self.waiting.set(waiting as i64);
        self.running.set(running as i64);
    }

    fn upload_admitted(&self) {
        self.admitted.inc();
    }

    fn upload_finished(&self, outcome: &'static str) {
        self.finished.with_label_values(&[outcome]).inc();
    }
}
