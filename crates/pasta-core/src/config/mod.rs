//! Persisted configuration records consumed by the upload queue.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use pasta_model::{UPLOAD_CONFIG_ID, UploadConfig};
use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    CoreError,
    sync::{read, write},
};

/// Source of the upload configuration record.
pub trait ConfigStore: Send + Sync + 'static {
    /// `Ok(None)` when no record exists under [`UPLOAD_CONFIG_ID`].
    fn load_upload_config(&self) -> Result<Option<UploadConfig>, CoreError>;
}

/// In-memory store, mostly for tests and embedding.
#[derive(Default)]
pub struct MemoryConfigStore {
    record: RwLock<Option<UploadConfig>>,
}

impl MemoryConfigStore {
    pub fn new(record: Option<UploadConfig>) -> Self {
        Self {
            record: RwLock::new(record),
        }
    }

    pub fn with_parallel_uploads(count: usize) -> Self {
        Self::new(Some(UploadConfig::with_parallel_uploads(count)))
    }

    pub fn set(&self, record: Option<UploadConfig>) {
        *write(&self.record) = record;
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_upload_config(&self) -> Result<Option<UploadConfig>, CoreError> {
        Ok(read(&self.record).clone())
    }
}

/// JSON file holding configuration records keyed by record id:
///
/// ```json
/// { "dataverseConfig": { "parallelUploadsCount": 3, "serverUrl": "https://demo.dataverse.org" } }
/// ```
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `record` under [`UPLOAD_CONFIG_ID`], keeping other records in the file.
    pub fn save_upload_config(&self, record: &UploadConfig) -> Result<(), CoreError> {
        let mut records = self.read_records()?.unwrap_or_default();
        let value = serde_json::to_value(record).map_err(|e| malformed(e.to_string()))?;
        records.insert(UPLOAD_CONFIG_ID.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&Value::Object(records))
            .map_err(|e| malformed(e.to_string()))?;
        fs::write(&self.path, body)?;
        Ok(())
    }

    fn read_records(&self) -> Result<Option<Map<String, Value>>, CoreError> {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "config file absent");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&body) {
            Ok(Value::Object(records)) => Ok(Some(records)),
            Ok(_) => Err(malformed("top level is not an object")),
            Err(e) => Err(malformed(e.to_string())),
        }
    }
}

impl ConfigStore for JsonConfigStore {
    fn load_upload_config(&self) -> Result<Option<UploadConfig>, CoreError> {
        let Some(mut records) = self.read_records()? else {
            return Ok(None);
        };
        match records.remove(UPLOAD_CONFIG_ID) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| malformed(e.to_string())),
            None => Ok(None),
        }
    }
}

fn malformed(reason: impl Into<String>) -> CoreError {
    CoreError::Malformed {
        id: UPLOAD_CONFIG_ID.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryConfigStore::default();
        assert_eq!(store.load_upload_config().unwrap(), None);

        store.set(Some(UploadConfig::with_parallel_uploads(3)));
        let cfg = store.load_upload_config().unwrap().unwrap();
        assert_eq!(cfg.concurrency_limit(), 3);
    }

    #[test]
    fn json_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path().join("config.json"));
        assert_eq!(store.load_upload_config().unwrap(), None);
    }

    #[test]
    fn json_store_save_keeps_other_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"-userConfig-": {"theme": "dark"}}"#).unwrap();

        let store = JsonConfigStore::new(&path);
        store
            .save_upload_config(&UploadConfig::with_parallel_uploads(5))
            .unwrap();

        let cfg = store.load_upload_config().unwrap().unwrap();
        assert_eq!(cfg.parallel_uploads_count, Some(5));

        let body = fs::read_to_string(&path).unwrap();
        let raw: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(raw["-userConfig-"]["theme"], "dark");
    }

    #[test]
    fn json_store_reports_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonConfigStore::new(&path).load_upload_config().unwrap_err();
        assert!(matches!(err, CoreError::Malformed { .. }));
    }
}
