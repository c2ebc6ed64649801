//! Extractor seam: turns a raw instrument file into preview + metadata.
//!
//! Concrete extractors live outside this crate; the router only picks one by
//! file and checks that its output honours the record contract.
use std::{path::Path, sync::Arc};

use pasta_model::ExtractorOutput;
use serde_json::Value;
use tracing::{instrument, trace};

use crate::CoreError;

pub trait Extractor: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Whether this extractor understands `path` (usually by extension).
    fn supports(&self, path: &Path) -> bool;

    /// Extract `path` using the recipe in `style`; `save_to` receives a
    /// full-size preview when given.
    fn extract(
        &self,
        path: &Path,
        style: &Value,
        save_to: Option<&Path>,
    ) -> Result<ExtractorOutput, CoreError>;
}

#[derive(Default)]
pub struct ExtractorRouter {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRouter {
    #[inline]
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    #[inline]
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.extractors.push(extractor);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// First registered extractor supporting `path`.
    pub fn pick(&self, path: &Path) -> Option<&Arc<dyn Extractor>> {
        self.extractors.iter().find(|e| e.supports(path))
    }

    #[instrument(level = "trace", skip(self, style, save_to), fields(path = %path.display()))]
    pub fn extract(
        &self,
        path: &Path,
        style: &Value,
        save_to: Option<&Path>,
    ) -> Result<ExtractorOutput, CoreError> {
        let extractor = self
            .pick(path)
            .ok_or_else(|| CoreError::NoExtractor(path.display().to_string()))?;

        let output = extractor.extract(path, style, save_to)?;
        if !output.has_valid_image() {
            return Err(CoreError::Extract {
                name: extractor.name().to_string(),
                reason: "image is neither a base64 data-URI nor inline svg".into(),
            });
        }
        trace!(extractor = extractor.name(), "extraction succeeded");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct CsvExtractor {
        image: &'static str,
    }

    impl Extractor for CsvExtractor {
        fn name(&self) -> &'static str {
            "csv"
        }

        fn supports(&self, path: &Path) -> bool {
            path.extension().is_some_and(|ext| ext == "csv")
        }

        fn extract(
            &self,
            path: &Path,
            style: &Value,
            _save_to: Option<&Path>,
        ) -> Result<ExtractorOutput, CoreError> {
            Ok(ExtractorOutput {
                image: self.image.to_string(),
                meta_vendor: json!({"file": path.display().to_string()}),
                meta_user: json!({}),
                style: style.clone(),
                content: None,
            })
        }
    }

    #[test]
    fn picks_by_support() {
        let mut router = ExtractorRouter::new();
        router.register(Arc::new(CsvExtractor { image: "<svg></svg>" }));

        let out = router
            .extract(Path::new("run1.csv"), &json!({"main": "measurement/csv"}), None)
            .unwrap();
        assert_eq!(out.style["main"], "measurement/csv");
        assert_eq!(out.meta_vendor["file"], "run1.csv");
    }

    #[test]
    fn unknown_file_has_no_extractor() {
        let mut router = ExtractorRouter::new();
        router.register(Arc::new(CsvExtractor { image: "<svg></svg>" }));

        let err = router
            .extract(Path::new("photo.tif"), &Value::Null, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::NoExtractor(_)));
    }

    #[test]
    fn invalid_image_is_rejected() {
        let mut router = ExtractorRouter::new();
        router.register(Arc::new(CsvExtractor { image: "preview.png" }));

        let err = router
            .extract(Path::new("run1.csv"), &Value::Null, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::Extract { .. }));
    }
}
