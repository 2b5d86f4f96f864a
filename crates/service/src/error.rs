use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configured root document not found: {0}")]
    RootNotFound(String),

    #[error(transparent)]
    Hierarchy(#[from] concept_hierarchy::HierarchyError),

    #[error("Failed to read settings {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write settings {path}: {source}")]
    SettingsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),
}
