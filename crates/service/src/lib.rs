//! # Concept Service
//!
//! Glue around the hierarchy engine: persisted settings, the model
//! coordinator that owns the published snapshot, and a filesystem
//! watcher that triggers rebuilds when contributing documents change.

mod coordinator;
mod error;
mod settings;
mod watcher;

pub use coordinator::{ModelCoordinator, RebuildOutcome};
pub use error::{Result, ServiceError};
pub use settings::Settings;
pub use watcher::{ChangeWatcher, WatcherConfig};

/// Default name of the settings file at the project root.
pub const SETTINGS_FILE: &str = "concept-hierarchy.toml";
