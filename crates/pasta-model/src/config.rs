use serde::{Deserialize, Serialize};

/// Record id under which the upload configuration is persisted.
pub const UPLOAD_CONFIG_ID: &str = "dataverseConfig";

/// Concurrency used when the record or its field is missing, or set to zero.
pub const DEFAULT_PARALLEL_UPLOADS: usize = 1;

/// Persisted Dataverse upload configuration.
///
/// Only `parallel_uploads_count` is consumed by the upload queue; the remaining
/// fields travel with the record so a round-trip through a store keeps them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_uploads_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataverse_id: Option<String>,
}

impl UploadConfig {
    pub fn with_parallel_uploads(count: usize) -> Self {
        Self {
            parallel_uploads_count: Some(count),
            ..Default::default()
        }
    }

    /// Effective concurrency limit, never below one.
    pub fn concurrency_limit(&self) -> usize {
        match self.parallel_uploads_count {
            Some(0) | None => DEFAULT_PARALLEL_UPLOADS,
            Some(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_falls_back_to_default() {
        let cfg: UploadConfig = serde_json::from_str(r#"{"serverUrl":"https://demo.dataverse.org"}"#).unwrap();
        assert_eq!(cfg.parallel_uploads_count, None);
        assert_eq!(cfg.concurrency_limit(), DEFAULT_PARALLEL_UPLOADS);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        assert_eq!(UploadConfig::with_parallel_uploads(0).concurrency_limit(), 1);
    }

    #[test]
    fn explicit_value_is_used() {
        let cfg: UploadConfig = serde_json::from_str(r#"{"parallelUploadsCount":4}"#).unwrap();
        assert_eq!(cfg.concurrency_limit(), 4);
    }
}
