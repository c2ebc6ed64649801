//! Upload job: queue one copy task per file and wait for the queue to drain.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use pasta_core::{
    ConfigStore, ExtractorRouter, FnTask, JsonConfigStore, QueueObserver, StateSummary, TaskError,
    TaskRef, TaskThread, UploadQueueManager,
};
use pasta_observe::Journal;
use pasta_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
use serde_json::json;
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncWriteExt},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;

const CHUNK: usize = 64 * 1024;

/// Upload `files`; with `extractors`, each copy gets a `<file>.meta.json`
/// next to it when an extractor supports the file.
pub async fn run(
    cfg: &AgentConfig,
    files: Vec<PathBuf>,
    extractors: Option<Arc<ExtractorRouter>>,
) -> anyhow::Result<StateSummary> {
    let outbox = cfg.outbox_dir();
    fs::create_dir_all(&outbox).await?;

    let store: Arc<dyn ConfigStore> = Arc::new(JsonConfigStore::new(cfg.config_file()));
    let metrics = PrometheusMetrics::new()?;
    let observers: Vec<Arc<dyn QueueObserver>> = vec![Arc::new(Journal::new())];
    let manager = UploadQueueManager::builder(store)
        .with_metrics(Arc::new(metrics.clone()))
        .with_observers(observers)
        .build();
    info!(limit = manager.limit(), files = files.len(), "upload queue ready");

    let admission = manager.spawn()?;
    for file in files {
        let task = copy_task(file, outbox.clone(), extractors.clone());
        manager.add_to_queue(TaskThread::spawn(task)?);
    }

    tokio::select! {
        _ = drained(&manager) => info!("all uploads finished"),
        res = tokio::signal::ctrl_c() => {
            res?;
            warn!("interrupted; cancelling uploads");
            manager.cancel_task();
        }
    }
    admission.quit();
    tokio::task::spawn_blocking(move || admission.join()).await?;

    let summary = settle(&manager);
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        canceled = summary.canceled,
        "upload summary"
    );
    debug!(metrics = %render(&metrics), "final metrics");
    Ok(summary)
}

async fn drained(manager: &UploadQueueManager) {
    loop {
        let summary = manager.state().summary();
        if summary.pending == 0 && summary.running == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Snapshot the registry, then drop its terminal entries.
fn settle(manager: &UploadQueueManager) -> StateSummary {
    let summary = manager.state().summary();
    let pruned = manager.state().clear_finished();
    debug!(pruned, "finished uploads pruned from registry");
    summary
}

fn render(metrics: &PrometheusMetrics) -> String {
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&metrics.gather(), &mut buf) {
        return format!("<encode failed: {e}>");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Task copying `source` into `outbox`, checking the token between chunks.
pub fn copy_task(
    source: PathBuf,
    outbox: PathBuf,
    extractors: Option<Arc<ExtractorRouter>>,
) -> TaskRef {
    let name = format!("upload {}", source.display());
    FnTask::arc(name, move |token| {
        let source = source.clone();
        let outbox = outbox.clone();
        let extractors = extractors.clone();
        async move {
            let target = copy_file(&source, &outbox, &token).await?;
            match extractors {
                Some(router) => attach_metadata(&router, &source, &target).await,
                None => Ok(()),
            }
        }
    })
}

async fn copy_file(
    source: &Path,
    outbox: &Path,
    token: &CancellationToken,
) -> Result<PathBuf, TaskError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| TaskError::fail(format!("{}: not a file", source.display())))?;
    let target = outbox.join(file_name);

    let mut reader = File::open(source)
        .await
        .map_err(|e| TaskError::fail(format!("{}: {e}", source.display())))?;
    let mut writer = File::create(&target)
        .await
        .map_err(|e| TaskError::fail(format!("{}: {e}", target.display())))?;

    let mut buf = vec![0u8; CHUNK];
    let mut copied = 0u64;
    loop {
        if token.is_cancelled() {
            drop(writer);
            let _ = fs::remove_file(&target).await;
            return Err(TaskError::Canceled);
        }
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| TaskError::fail(e.to_string()))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(|e| TaskError::fail(e.to_string()))?;
        copied += n as u64;
    }
    writer
        .flush()
        .await
        .map_err(|e| TaskError::fail(e.to_string()))?;
    debug!(source = %source.display(), bytes = copied, "file copied");
    Ok(target)
}

/// Write `<target>.meta.json` from the extractor that supports `source`.
/// Files no extractor supports are uploaded without metadata.
async fn attach_metadata(
    router: &ExtractorRouter,
    source: &Path,
    target: &Path,
) -> Result<(), TaskError> {
    if router.pick(source).is_none() {
        debug!(source = %source.display(), "no extractor; upload without metadata");
        return Ok(());
    }
    let output = router
        .extract(source, &json!({}), None)
        .map_err(|e| TaskError::fail(e.to_string()))?;
    let body = serde_json::to_vec_pretty(&output).map_err(|e| TaskError::fail(e.to_string()))?;

    let mut meta = target.as_os_str().to_owned();
    meta.push(".meta.json");
    fs::write(PathBuf::from(meta), body)
        .await
        .map_err(|e| TaskError::fail(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pasta_core::{CoreError, Extractor, MemoryConfigStore, Task};
    use pasta_model::ExtractorOutput;
    use serde_json::Value;

    struct CsvPreview {
        image: &'static str,
    }

    impl Extractor for CsvPreview {
        fn name(&self) -> &'static str {
            "csv-preview"
        }

        fn supports(&self, path: &Path) -> bool {
            path.extension().is_some_and(|ext| ext == "csv")
        }

        fn extract(
            &self,
            path: &Path,
            style: &Value,
            _save_to: Option<&Path>,
        ) -> Result<ExtractorOutput, CoreError> {
            Ok(ExtractorOutput {
                image: self.image.to_string(),
                meta_vendor: json!({"source": path.display().to_string()}),
                meta_user: json!({}),
                style: style.clone(),
                content: None,
            })
        }
    }

    fn router(image: &'static str) -> Option<Arc<ExtractorRouter>> {
        let mut router = ExtractorRouter::new();
        router.register(Arc::new(CsvPreview { image }));
        Some(Arc::new(router))
    }

    #[tokio::test]
    async fn copies_file_into_outbox() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.csv");
        std::fs::write(&source, vec![7u8; CHUNK * 2 + 5]).unwrap();
        let outbox = dir.path().join("outbox");
        std::fs::create_dir_all(&outbox).unwrap();

        let target = copy_file(&source, &outbox, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(target, outbox.join("scan.csv"));
        assert_eq!(std::fs::read(target).unwrap().len(), CHUNK * 2 + 5);
    }

    #[tokio::test]
    async fn cancelled_copy_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.csv");
        std::fs::write(&source, b"abc").unwrap();
        let outbox = dir.path().join("outbox");
        std::fs::create_dir_all(&outbox).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let res = copy_file(&source, &outbox, &token).await;
        assert_eq!(res, Err(TaskError::Canceled));
        assert!(!outbox.join("scan.csv").exists());
    }

    #[tokio::test]
    async fn missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let res = copy_file(
            &dir.path().join("absent.bin"),
            dir.path(),
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(res, Err(TaskError::Fail { reason }) if reason.contains("absent.bin")));
    }

    #[tokio::test]
    async fn supported_file_gets_metadata_next_to_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("run1.csv");
        std::fs::write(&source, "t,v\n0,1\n").unwrap();
        let outbox = dir.path().join("outbox");
        std::fs::create_dir_all(&outbox).unwrap();

        let task = copy_task(source.clone(), outbox.clone(), router("<svg></svg>"));
        task.run(CancellationToken::new()).await.unwrap();

        let body = std::fs::read_to_string(outbox.join("run1.csv.meta.json")).unwrap();
        let meta: ExtractorOutput = serde_json::from_str(&body).unwrap();
        assert_eq!(meta.image, "<svg></svg>");
        assert_eq!(meta.meta_vendor["source"], source.display().to_string());
        assert!(outbox.join("run1.csv").exists());
    }

    #[tokio::test]
    async fn unsupported_file_is_uploaded_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.tif");
        std::fs::write(&source, b"II*").unwrap();
        let outbox = dir.path().join("outbox");
        std::fs::create_dir_all(&outbox).unwrap();

        let task = copy_task(source, outbox.clone(), router("<svg></svg>"));
        task.run(CancellationToken::new()).await.unwrap();

        assert!(outbox.join("photo.tif").exists());
        assert!(!outbox.join("photo.tif.meta.json").exists());
    }

    #[tokio::test]
    async fn invalid_extractor_output_fails_upload() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("run1.csv");
        std::fs::write(&source, "t,v\n").unwrap();
        let outbox = dir.path().join("outbox");
        std::fs::create_dir_all(&outbox).unwrap();

        let task = copy_task(source, outbox.clone(), router("preview.png"));
        let res = task.run(CancellationToken::new()).await;
        assert!(matches!(res, Err(TaskError::Fail { .. })));
        assert!(!outbox.join("run1.csv.meta.json").exists());
    }

    #[tokio::test]
    async fn settle_prunes_finished_entries() {
        let store = Arc::new(MemoryConfigStore::with_parallel_uploads(2));
        let manager = UploadQueueManager::builder(store)
            .with_poll_interval(Duration::from_millis(20))
            .build();
        let admission = manager.spawn().unwrap();
        let done = FnTask::arc("done", |_token| async move { Ok(()) });
        manager.add_to_queue(TaskThread::spawn(done).unwrap());

        drained(&manager).await;
        let summary = settle(&manager);
        assert_eq!(summary.succeeded, 1);
        assert!(manager.state().list().is_empty());

        admission.quit();
        tokio::task::spawn_blocking(move || admission.join())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn run_drains_queue_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("f{i}.txt"));
                std::fs::write(&path, format!("payload {i}")).unwrap();
                path
            })
            .collect();
        let cfg = AgentConfig::at(dir.path().join("home"));

        let summary = run(&cfg, files, None).await.unwrap();
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 0);
        assert!(cfg.outbox_dir().join("f2.txt").exists());
    }
}
