//! Generation options shared by every target.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::base::constants::DEFAULT_LANGUAGE;

/// Failure to load generation options
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("cannot read options file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options for one generation run.
///
/// Every field has a default, so an options file only needs to name the
/// values it changes:
///
/// ```json
/// { "version": "v1.4.0", "parallel": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Stamped into the header of every generated source
    pub version: String,
    /// Language tag selecting which fragments are injected
    pub language: String,
    /// Assemble independent components on the rayon pool
    pub parallel: bool,
    /// Target-specific settings, in file order
    pub extra: IndexMap<String, String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            version: "undefined".to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            parallel: true,
            extra: IndexMap::new(),
        }
    }
}

impl GenerationOptions {
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let opts = GenerationOptions::from_json_str(r#"{ "version": "v2" }"#).unwrap();
        assert_eq!(opts.version, "v2");
        assert_eq!(opts.language, "TypeScript");
        assert!(opts.parallel);
        assert!(opts.extra.is_empty());
    }

    #[test]
    fn test_extra_keeps_file_order() {
        let opts =
            GenerationOptions::from_json_str(r#"{ "extra": { "z": "1", "a": "2" } }"#).unwrap();
        let keys: Vec<_> = opts.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            GenerationOptions::from_json_str("{ version: }"),
            Err(OptionsError::Json(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{ "parallel": false }"#).unwrap();
        let opts = GenerationOptions::from_json_file(&path).unwrap();
        assert!(!opts.parallel);
        assert!(matches!(
            GenerationOptions::from_json_file(&dir.path().join("missing.json")),
            Err(OptionsError::Io { .. })
        ));
    }
}
