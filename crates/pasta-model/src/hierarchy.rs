//! Typed views over the data-hierarchy (ontology) document.
//!
//! The document itself is edited as loose JSON because older versions store
//! shapes these types cannot represent (bare property lists). After the v3
//! upgrade every data-type entry deserializes into [`DataType`].
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Document id of the data hierarchy in the document store.
pub const ONTOLOGY_DOC_ID: &str = "-ontology-";

/// Top-level key carrying the schema version.
pub const VERSION_KEY: &str = "-version";

/// Schema version written by the upgrade.
pub const ONTOLOGY_VERSION: u64 = 3;

/// Category that receives properties found as a bare list.
pub const DEFAULT_CATEGORY: &str = "default";

/// Returns `true` for keys naming a data type, `false` for metadata keys
/// such as `-version`, `_id` or `_rev`.
pub fn is_data_type_key(key: &str) -> bool {
    !(key.starts_with('-') || key.starts_with('_'))
}

/// One data type of the hierarchy (`x0` projects, `measurement`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataType {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "IRI", default)]
    pub iri: String,
    /// Property rows grouped by category.
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<PropertyRow>>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// One property definition row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Allowed values, or a single data-type name the value links to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListOrLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// `list` holds either a single link target or an explicit list of choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListOrLink {
    Link(String),
    Choices(Vec<String>),
}

/// Attachment slot of a data type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}
