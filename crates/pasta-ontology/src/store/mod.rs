//! Persistence of whole JSON documents keyed by id.
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use serde_json::{Map, Value};
use tracing::trace;

use crate::OntologyError;

pub trait DocumentStore: Send + Sync + 'static {
    /// `Ok(None)` when no document has this id.
    fn get(&self, id: &str) -> Result<Option<Map<String, Value>>, OntologyError>;

    fn put(&self, id: &str, doc: &Map<String, Value>) -> Result<(), OntologyError>;
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<String, Map<String, Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, id: &str) -> Result<Option<Map<String, Value>>, OntologyError> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.get(id).cloned())
    }

    fn put(&self, id: &str, doc: &Map<String, Value>) -> Result<(), OntologyError> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.insert(id.to_string(), doc.clone());
        Ok(())
    }
}

/// One pretty-printed `<id>.json` file per document inside `dir`.
pub struct JsonDocumentStore {
    dir: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, OntologyError> {
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(OntologyError::InvalidName(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl DocumentStore for JsonDocumentStore {
    fn get(&self, id: &str) -> Result<Option<Map<String, Value>>, OntologyError> {
        let path = self.path_for(id)?;
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        trace!(path = %path.display(), "document read");

        match serde_json::from_str(&body) {
            Ok(Value::Object(doc)) => Ok(Some(doc)),
            Ok(_) => Err(OntologyError::Json {
                id: id.to_string(),
                reason: "top level is not an object".into(),
            }),
            Err(e) => Err(OntologyError::Json {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn put(&self, id: &str, doc: &Map<String, Value>) -> Result<(), OntologyError> {
        let path = self.path_for(id)?;
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_string_pretty(doc).map_err(|e| OntologyError::Json {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        // Readers only ever see a complete file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        trace!(path = %path.display(), "document written");
        Ok(())
    }
}
