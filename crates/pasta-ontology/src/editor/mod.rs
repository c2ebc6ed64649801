//! Editing session over the stored data hierarchy.
//!
//! The editor owns a copy of the document. Tables handed out by
//! [`DataHierarchyEditor::property_table`] are detached; edits reach the
//! document through the matching `apply_*` call and the store through
//! [`DataHierarchyEditor::save`].
use std::sync::Arc;

use pasta_model::{
    DEFAULT_CATEGORY, DataType, ONTOLOGY_DOC_ID, ONTOLOGY_VERSION, VERSION_KEY, is_data_type_key,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use crate::{
    ATTACHMENT_COLUMNS, DocumentStore, OntologyError, PROPERTY_COLUMNS, Row, TableModel,
    adjust_ontology_data_to_v3,
};

pub struct DataHierarchyEditor {
    store: Arc<dyn DocumentStore>,
    doc: Map<String, Value>,
    dirty: bool,
}

impl DataHierarchyEditor {
    /// Load the hierarchy and upgrade it to v3 in memory.
    ///
    /// The upgrade is only persisted by [`DataHierarchyEditor::save`].
    #[instrument(level = "debug", skip(store))]
    pub fn load(store: Arc<dyn DocumentStore>) -> Result<Self, OntologyError> {
        let mut doc = store
            .get(ONTOLOGY_DOC_ID)?
            .ok_or_else(|| OntologyError::NotFound(ONTOLOGY_DOC_ID.to_string()))?;

        let upgraded = adjust_ontology_data_to_v3(&mut doc);
        if upgraded {
            info!("data hierarchy upgraded to version {ONTOLOGY_VERSION}");
        }
        Ok(Self {
            store,
            doc,
            dirty: upgraded,
        })
    }

    /// Start from an empty v3 hierarchy (nothing is written until `save`).
    pub fn create(store: Arc<dyn DocumentStore>) -> Self {
        let mut doc = Map::new();
        doc.insert("_id".into(), Value::from(ONTOLOGY_DOC_ID));
        doc.insert(VERSION_KEY.into(), Value::from(ONTOLOGY_VERSION));
        Self {
            store,
            doc,
            dirty: true,
        }
    }

    #[inline]
    pub fn document(&self) -> &Map<String, Value> {
        &self.doc
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn data_types(&self) -> Vec<String> {
        self.doc
            .keys()
            .filter(|k| is_data_type_key(k))
            .cloned()
            .collect()
    }

    /// Typed view of one data type.
    pub fn data_type(&self, doc_type: &str) -> Result<DataType, OntologyError> {
        let entry = self.entry(doc_type)?;
        serde_json::from_value(Value::Object(entry.clone())).map_err(|e| {
            OntologyError::Malformed {
                doc_type: doc_type.to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub fn categories(&self, doc_type: &str) -> Result<Vec<String>, OntologyError> {
        Ok(self.properties(doc_type)?.keys().cloned().collect())
    }

    pub fn add_data_type(&mut self, doc_type: &str, label: &str) -> Result<(), OntologyError> {
        validate_name(doc_type)?;
        if self.doc.contains_key(doc_type) {
            return Err(OntologyError::DataTypeExists(doc_type.to_string()));
        }
        self.doc.insert(
            doc_type.to_string(),
            json!({
                "label": label,
                "IRI": "",
                "properties": { DEFAULT_CATEGORY: [ {"name": "-name", "required": true} ] },
                "attachments": []
            }),
        );
        self.dirty = true;
        debug!(doc_type, "data type added");
        Ok(())
    }

    pub fn remove_data_type(&mut self, doc_type: &str) -> Result<(), OntologyError> {
        if !is_data_type_key(doc_type) || self.doc.remove(doc_type).is_none() {
            return Err(OntologyError::UnknownDataType(doc_type.to_string()));
        }
        self.dirty = true;
        debug!(doc_type, "data type removed");
        Ok(())
    }

    pub fn add_category(&mut self, doc_type: &str, category: &str) -> Result<(), OntologyError> {
        validate_name(category)?;
        let props = self.properties_mut(doc_type)?;
        if props.contains_key(category) {
            return Err(OntologyError::CategoryExists {
                doc_type: doc_type.to_string(),
                category: category.to_string(),
            });
        }
        props.insert(category.to_string(), Value::Array(Vec::new()));
        self.dirty = true;
        Ok(())
    }

    pub fn remove_category(&mut self, doc_type: &str, category: &str) -> Result<(), OntologyError> {
        let props = self.properties_mut(doc_type)?;
        if props.remove(category).is_none() {
            return Err(unknown_category(doc_type, category));
        }
        self.dirty = true;
        Ok(())
    }

    /// Table over the property rows of `doc_type` / `category`.
    pub fn property_table(
        &self,
        doc_type: &str,
        category: &str,
    ) -> Result<TableModel, OntologyError> {
        let rows = self
            .properties(doc_type)?
            .get(category)
            .ok_or_else(|| unknown_category(doc_type, category))?;
        Ok(TableModel::new(PROPERTY_COLUMNS, rows_of(doc_type, rows)))
    }

    pub fn apply_property_table(
        &mut self,
        doc_type: &str,
        category: &str,
        table: TableModel,
    ) -> Result<(), OntologyError> {
        let props = self.properties_mut(doc_type)?;
        let slot = props
            .get_mut(category)
            .ok_or_else(|| unknown_category(doc_type, category))?;
        *slot = Value::Array(table.into_rows().into_iter().map(Value::Object).collect());
        self.dirty = true;
        Ok(())
    }

    pub fn attachment_table(&self, doc_type: &str) -> Result<TableModel, OntologyError> {
        let rows = self
            .entry(doc_type)?
            .get("attachments")
            .unwrap_or(&Value::Null);
        Ok(TableModel::new(ATTACHMENT_COLUMNS, rows_of(doc_type, rows)))
    }

    pub fn apply_attachment_table(
        &mut self,
        doc_type: &str,
        table: TableModel,
    ) -> Result<(), OntologyError> {
        let entry = self.entry_mut(doc_type)?;
        entry.insert(
            "attachments".into(),
            Value::Array(table.into_rows().into_iter().map(Value::Object).collect()),
        );
        self.dirty = true;
        Ok(())
    }

    /// Write the document back; no-op when nothing changed.
    #[instrument(level = "debug", skip(self))]
    pub fn save(&mut self) -> Result<(), OntologyError> {
        if !self.dirty {
            return Ok(());
        }
        self.store.put(ONTOLOGY_DOC_ID, &self.doc)?;
        self.dirty = false;
        info!(data_types = self.data_types().len(), "data hierarchy saved");
        Ok(())
    }

    fn entry(&self, doc_type: &str) -> Result<&Map<String, Value>, OntologyError> {
        if !is_data_type_key(doc_type) {
            return Err(OntologyError::UnknownDataType(doc_type.to_string()));
        }
        match self.doc.get(doc_type) {
            Some(Value::Object(entry)) => Ok(entry),
            Some(_) => Err(malformed(doc_type, "entry is not an object")),
            None => Err(OntologyError::UnknownDataType(doc_type.to_string())),
        }
    }

    fn entry_mut(&mut self, doc_type: &str) -> Result<&mut Map<String, Value>, OntologyError> {
        if !is_data_type_key(doc_type) {
            return Err(OntologyError::UnknownDataType(doc_type.to_string()));
        }
        match self.doc.get_mut(doc_type) {
            Some(Value::Object(entry)) => Ok(entry),
            Some(_) => Err(malformed(doc_type, "entry is not an object")),
            None => Err(OntologyError::UnknownDataType(doc_type.to_string())),
        }
    }

    fn properties(&self, doc_type: &str) -> Result<&Map<String, Value>, OntologyError> {
        match self.entry(doc_type)?.get("properties") {
            Some(Value::Object(props)) => Ok(props),
            _ => Err(malformed(doc_type, "properties is not a mapping")),
        }
    }

    fn properties_mut(
        &mut self,
        doc_type: &str,
    ) -> Result<&mut Map<String, Value>, OntologyError> {
        match self.entry_mut(doc_type)?.get_mut("properties") {
            Some(Value::Object(props)) => Ok(props),
            _ => Err(malformed(doc_type, "properties is not a mapping")),
        }
    }
}

fn rows_of(doc_type: &str, value: &Value) -> Vec<Row> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(row) => Some(row.clone()),
            other => {
                warn!(doc_type, row = %other, "row is not an object; skipped");
                None
            }
        })
        .collect()
}

fn validate_name(name: &str) -> Result<(), OntologyError> {
    if name.is_empty() || !is_data_type_key(name) || name.chars().any(char::is_whitespace) {
        return Err(OntologyError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn unknown_category(doc_type: &str, category: &str) -> OntologyError {
    OntologyError::UnknownCategory {
        doc_type: doc_type.to_string(),
        category: category.to_string(),
    }
}

fn malformed(doc_type: &str, reason: &str) -> OntologyError {
    OntologyError::Malformed {
        doc_type: doc_type.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryDocumentStore;
    use pasta_model::ListOrLink;

    fn seeded_store() -> Arc<dyn DocumentStore> {
        let store = MemoryDocumentStore::new();
        let doc = json!({
            "_id": "-ontology-",
            "-version": 2,
            "x0": {
                "label": "Projects",
                "IRI": "",
                "properties": [
                    {"name": "-name", "required": true},
                    {"name": "status", "list": ["active", "paused"]},
                    {"name": "objective"}
                ]
            }
        });
        store
            .put(ONTOLOGY_DOC_ID, doc.as_object().unwrap())
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn load_upgrades_and_marks_dirty() {
        let editor = DataHierarchyEditor::load(seeded_store()).unwrap();
        assert!(editor.is_dirty());
        assert_eq!(editor.document()[VERSION_KEY], json!(3));
        assert_eq!(editor.data_types(), ["x0"]);
        assert_eq!(editor.categories("x0").unwrap(), [DEFAULT_CATEGORY]);
    }

    #[test]
    fn load_missing_document_fails() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        assert!(matches!(
            DataHierarchyEditor::load(store),
            Err(OntologyError::NotFound(_))
        ));
    }

    #[test]
    fn edit_property_table_and_save() {
        let store = seeded_store();
        let mut editor = DataHierarchyEditor::load(Arc::clone(&store)).unwrap();

        let mut table = editor.property_table("x0", DEFAULT_CATEGORY).unwrap();
        assert_eq!(table.row_count(), 3);
        table.reorder_up(2);
        table.add_empty_row();
        table.set(3, 0, json!("funding"));
        table.set(3, 2, json!("internal, external"));
        table.set(3, 3, json!("x0"));
        table.activate(3, 5);
        editor
            .apply_property_table("x0", DEFAULT_CATEGORY, table)
            .unwrap();
        editor.save().unwrap();
        assert!(!editor.is_dirty());

        let reloaded = DataHierarchyEditor::load(store).unwrap();
        assert!(!reloaded.is_dirty());
        let x0 = reloaded.data_type("x0").unwrap();
        let rows = &x0.properties[DEFAULT_CATEGORY];
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["-name", "objective", "status", "funding"]);
        assert!(rows[3].required);
        assert_eq!(rows[3].link.as_deref(), Some("x0"));
        assert_eq!(
            rows[3].list,
            Some(ListOrLink::Choices(vec!["internal".into(), "external".into()]))
        );
    }

    #[test]
    fn data_types_and_categories_lifecycle() {
        let mut editor = DataHierarchyEditor::create(Arc::new(MemoryDocumentStore::new()));
        editor.add_data_type("sample", "Samples").unwrap();
        assert!(matches!(
            editor.add_data_type("sample", "again"),
            Err(OntologyError::DataTypeExists(_))
        ));
        assert!(matches!(
            editor.add_data_type("-version", "nope"),
            Err(OntologyError::InvalidName(_))
        ));
        assert!(matches!(
            editor.add_data_type("two words", "nope"),
            Err(OntologyError::InvalidName(_))
        ));

        editor.add_category("sample", "chemistry").unwrap();
        assert_eq!(
            editor.categories("sample").unwrap(),
            ["chemistry", DEFAULT_CATEGORY]
        );
        editor.remove_category("sample", "chemistry").unwrap();
        assert!(matches!(
            editor.remove_category("sample", "chemistry"),
            Err(OntologyError::UnknownCategory { .. })
        ));

        let table = editor.property_table("sample", DEFAULT_CATEGORY).unwrap();
        assert_eq!(table.get(0, 0), json!("-name"));

        editor.remove_data_type("sample").unwrap();
        assert!(editor.data_types().is_empty());
        assert!(matches!(
            editor.remove_data_type("_id"),
            Err(OntologyError::UnknownDataType(_))
        ));
    }

    #[test]
    fn attachment_table_roundtrip() {
        let mut editor = DataHierarchyEditor::load(seeded_store()).unwrap();
        let mut table = editor.attachment_table("x0").unwrap();
        assert_eq!(table.row_count(), 0);

        table.add_empty_row();
        table.set(0, 0, json!("instrument used"));
        table.set(0, 1, json!("instrument"));
        editor.apply_attachment_table("x0", table).unwrap();

        let x0 = editor.data_type("x0").unwrap();
        assert_eq!(x0.attachments[0].description, "instrument used");
        assert_eq!(x0.attachments[0].target_type.as_deref(), Some("instrument"));
    }

    #[test]
    fn unknown_type_is_reported() {
        let editor = DataHierarchyEditor::load(seeded_store()).unwrap();
        assert!(matches!(
            editor.property_table("nope", DEFAULT_CATEGORY),
            Err(OntologyError::UnknownDataType(_))
        ));
        assert!(matches!(
            editor.property_table("x0", "missing"),
            Err(OntologyError::UnknownCategory { .. })
        ));
    }
}
