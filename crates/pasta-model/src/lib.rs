//! Plain data types shared by the PASTA upload queue and the data-hierarchy editor.
//!
//! Nothing in this crate performs I/O; it only describes records and their serde layout.

mod domain;
pub use domain::*;

mod config;
pub use config::{DEFAULT_PARALLEL_UPLOADS, UPLOAD_CONFIG_ID, UploadConfig};

mod hierarchy;
pub use hierarchy::{
    Attachment, DEFAULT_CATEGORY, DataType, ListOrLink, ONTOLOGY_DOC_ID, ONTOLOGY_VERSION,
    PropertyRow, VERSION_KEY, is_data_type_key,
};

mod extractor;
pub use extractor::ExtractorOutput;
