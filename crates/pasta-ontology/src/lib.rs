//! Editing model for the data hierarchy (ontology) document.

mod error;
pub use error::OntologyError;

pub mod table;
pub use table::{ATTACHMENT_COLUMNS, Column, ColumnKind, PROPERTY_COLUMNS, Row, TableModel};

mod upgrade;
pub use upgrade::adjust_ontology_data_to_v3;

pub mod store;
pub use store::{DocumentStore, JsonDocumentStore, MemoryDocumentStore};

pub mod editor;
pub use editor::DataHierarchyEditor;
