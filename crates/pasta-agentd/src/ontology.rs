//! Upgrade job: bring the stored data hierarchy to version 3.
use std::sync::Arc;

use pasta_ontology::{DataHierarchyEditor, DocumentStore, JsonDocumentStore, OntologyError};
use tracing::{info, warn};

use crate::config::AgentConfig;

/// Returns `true` when the stored document was rewritten.
pub fn upgrade(cfg: &AgentConfig) -> anyhow::Result<bool> {
    let store: Arc<dyn DocumentStore> = Arc::new(JsonDocumentStore::new(cfg.docs_dir()));
    let mut editor = match DataHierarchyEditor::load(store) {
        Ok(editor) => editor,
        Err(OntologyError::NotFound(id)) => {
            warn!(%id, dir = %cfg.docs_dir().display(), "no data hierarchy stored; nothing to upgrade");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let changed = editor.is_dirty();
    editor.save()?;
    info!(
        changed,
        data_types = editor.data_types().len(),
        "data hierarchy is at version 3"
    );
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pasta_model::ONTOLOGY_DOC_ID;

    fn cfg_at(home: &std::path::Path) -> AgentConfig {
        AgentConfig::at(home)
    }

    #[test]
    fn upgrade_rewrites_once() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_at(dir.path());
        let store = JsonDocumentStore::new(cfg.docs_dir());
        let doc = v2_doc();
        store.put(ONTOLOGY_DOC_ID, &doc).unwrap();

        assert!(upgrade(&cfg).unwrap());
        assert!(!upgrade(&cfg).unwrap());

        let stored = store.get(ONTOLOGY_DOC_ID).unwrap().unwrap();
        assert!(stored["measurement"]["properties"].is_object());
    }

    #[test]
    fn missing_document_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!upgrade(&cfg_at(dir.path())).unwrap());
    }

    fn v2_doc() -> pasta_ontology::Row {
        let mut doc = pasta_ontology::Row::new();
        doc.insert("-version".into(), 2.into());
        doc.insert(
            "measurement".into(),
            serde_json::json!({"label": "Measurements", "properties": [{"name": "-name"}]}),
        );
        doc
    }
}
