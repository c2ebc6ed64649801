use thiserror::Error;

#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid json in {id}: {reason}")]
    Json { id: String, reason: String },
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("unknown data type: {0}")]
    UnknownDataType(String),
    #[error("data type already exists: {0}")]
    DataTypeExists(String),
    #[error("unknown category {category} in {doc_type}")]
    UnknownCategory { doc_type: String, category: String },
    #[error("category {category} already exists in {doc_type}")]
    CategoryExists { doc_type: String, category: String },
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("malformed entry {doc_type}: {reason}")]
    Malformed { doc_type: String, reason: String },
}

impl From<std::io::Error> for OntologyError {
    fn from(e: std::io::Error) -> Self {
        OntologyError::Io(e.to_string())
    }
}
