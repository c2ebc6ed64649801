use pasta_model::{DEFAULT_CATEGORY, ONTOLOGY_VERSION, VERSION_KEY, is_data_type_key};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Bring a data-hierarchy document to schema version 3, in place.
///
/// Every data-type entry gets an `attachments` array (empty by default) and a
/// `properties` mapping keyed by category; a bare property list is moved under
/// the `"default"` category. The document is stamped with `-version: 3`.
/// Already upgraded entries are left untouched, so running it twice equals
/// running it once. Returns `true` if anything changed.
pub fn adjust_ontology_data_to_v3(doc: &mut Map<String, Value>) -> bool {
    let mut changed = false;

    for (doc_type, entry) in doc.iter_mut() {
        if !is_data_type_key(doc_type) {
            continue;
        }
        let Value::Object(entry) = entry else {
            warn!(doc_type, "data type entry is not an object; skipped");
            continue;
        };

        if !entry.contains_key("attachments") {
            entry.insert("attachments".into(), Value::Array(Vec::new()));
            changed = true;
        }

        match entry.get_mut("properties") {
            Some(Value::Object(_)) => {}
            Some(props @ Value::Array(_)) => {
                let list = props.take();
                let mut by_category = Map::new();
                by_category.insert(DEFAULT_CATEGORY.into(), list);
                *props = Value::Object(by_category);
                debug!(doc_type, "wrapped bare property list into default category");
                changed = true;
            }
            Some(other) => {
                warn!(doc_type, found = %other, "properties is neither a list nor a mapping; left as is");
            }
            None => {
                entry.insert("properties".into(), Value::Object(Map::new()));
                changed = true;
            }
        }
    }

    let version = Value::from(ONTOLOGY_VERSION);
    if doc.get(VERSION_KEY) != Some(&version) {
        doc.insert(VERSION_KEY.into(), version);
        changed = true;
    }
    changed
}
