use crate::error::{Result, ServiceError};
use concept_hierarchy::{ClassificationRoots, Keywords, ResolveOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Persisted per-project configuration.
///
/// Stored as TOML next to the project; everything has a default, so a
/// missing file means "not configured yet" rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Project-relative or absolute path to the root document.
    pub root_path: Option<String>,

    /// Also follow `header` references during traversal.
    pub resolve_headers: bool,

    /// Property names where cross-document references are valid;
    /// string values elsewhere are never treated as references.
    pub reference_contexts: Vec<String>,

    /// Reserved property names.
    pub keywords: Keywords,

    /// Well-known root concept names for classification.
    pub classification: ClassificationRoots,
}

impl Default for Settings {
    fn default() -> Self {
        let keywords = Keywords::default();
        let reference_contexts = vec![
            keywords.external.clone(),
            keywords.data.clone(),
            keywords.header.clone(),
        ];
        Self {
            root_path: None,
            resolve_headers: false,
            reference_contexts,
            keywords,
            classification: ClassificationRoots::default(),
        }
    }
}

impl Settings {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            keywords: self.keywords.clone(),
            resolve_headers: self.resolve_headers,
        }
    }

    /// Whether a string value under this property name may reference
    /// another document.
    pub fn is_reference_context(&self, property: &str) -> bool {
        self.reference_contexts.iter().any(|name| name == property)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ServiceError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ServiceError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings, treating a missing file as defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(ServiceError::SettingsRead { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ServiceError::SettingsWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
