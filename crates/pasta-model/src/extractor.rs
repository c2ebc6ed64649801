use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record returned by an extractor for one raw instrument file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorOutput {
    /// Preview as a base64 data-URI or as inline SVG markup.
    pub image: String,
    /// Metadata read from the file as the instrument vendor wrote it.
    #[serde(default)]
    pub meta_vendor: Value,
    /// Metadata curated for the user (units, derived values).
    #[serde(default)]
    pub meta_user: Value,
    /// Recipe used for the extraction, e.g. `{"main": "measurement/csv/linear"}`.
    #[serde(default)]
    pub style: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ExtractorOutput {
    /// Returns `true` if `image` is a base64 image data-URI or inline SVG.
    pub fn has_valid_image(&self) -> bool {
        let image = self.image.trim_start();
        if image.starts_with("<svg") || image.starts_with("<?xml") {
            return image.contains("<svg");
        }
        match image.strip_prefix("data:image/") {
            Some(rest) => rest
                .split_once(";base64,")
                .is_some_and(|(mime, payload)| !mime.is_empty() && !payload.is_empty()),
            None => false,
        }
    }
}
