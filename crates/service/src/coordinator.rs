use crate::error::{Result, ServiceError};
use crate::settings::Settings;
use concept_document::DocumentStore;
use concept_hierarchy::{build_snapshot, Classifier, Diagnostic, HierarchySnapshot};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// What a rebuild request ended up doing.
#[derive(Debug)]
pub enum RebuildOutcome {
    /// A new snapshot was built and published.
    Built {
        snapshot: Arc<HierarchySnapshot>,
        diagnostics: Vec<Diagnostic>,
    },

    /// No root document is configured; nothing to do.
    NoRoot,
}

/// Owns the current hierarchy snapshot.
///
/// Rebuilds are serialized: a second `rebuild` call waits for the
/// in-flight one to finish, then runs against the then-current state.
/// The snapshot itself is published by a single whole-value swap, so
/// readers see either the previous complete model or the new one.
/// A failed rebuild leaves the previous snapshot in place.
pub struct ModelCoordinator {
    store: Arc<dyn DocumentStore>,
    settings: Settings,
    current: RwLock<Option<Arc<HierarchySnapshot>>>,
    rebuild_gate: Mutex<()>,
}

/// Locks in this module tolerate poisoning: a panicked rebuild has no
/// partial effects to protect against, the previous snapshot is still
/// the published one.
fn relock<T>(result: std::sync::LockResult<T>) -> T {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ModelCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>, settings: Settings) -> Self {
        Self {
            store,
            settings,
            current: RwLock::new(None),
            rebuild_gate: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// The currently published snapshot, if any rebuild has succeeded.
    pub fn current(&self) -> Option<Arc<HierarchySnapshot>> {
        relock(self.current.read()).clone()
    }

    /// Rebuild the model from the configured root and publish the
    /// result. Blocking document reads happen outside the publication
    /// lock; only the final swap takes it.
    pub fn rebuild(&self) -> Result<RebuildOutcome> {
        let _gate: MutexGuard<'_, ()> = relock(self.rebuild_gate.lock());

        let Some(root_path) = self.settings.root_path.as_deref() else {
            info!("No root document configured, nothing to rebuild");
            return Ok(RebuildOutcome::NoRoot);
        };
        let root = self
            .store
            .resolve_root(root_path)
            .ok_or_else(|| ServiceError::RootNotFound(root_path.to_string()))?;

        info!("Rebuilding concept hierarchy from {root}");
        let outcome = build_snapshot(self.store.as_ref(), root, &self.settings.resolve_options())?;
        for diagnostic in &outcome.diagnostics {
            warn!("{diagnostic}");
        }

        let snapshot = Arc::new(outcome.snapshot);
        *relock(self.current.write()) = Some(snapshot.clone());
        info!(
            "Published hierarchy snapshot: {} documents, {} concepts",
            snapshot.included_documents.len() + 1,
            snapshot.concepts.len()
        );

        Ok(RebuildOutcome::Built {
            snapshot,
            diagnostics: outcome.diagnostics,
        })
    }

    /// Documents whose change should trigger a rebuild: the configured
    /// root plus everything the current snapshot includes.
    pub fn interesting_paths(&self) -> HashSet<String> {
        let mut paths = HashSet::new();
        if let Some(root_path) = self.settings.root_path.as_deref() {
            if let Some(root) = self.store.resolve_root(root_path) {
                paths.insert(root.as_str().to_string());
            }
        }
        if let Some(snapshot) = self.current() {
            for id in snapshot.contributing_documents() {
                paths.insert(id.as_str().to_string());
            }
        }
        paths
    }

    pub fn is_concept(&self, name: &str) -> bool {
        self.current().is_some_and(|s| s.is_concept(name))
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.current().is_some_and(|snapshot| {
            Classifier::new(&snapshot, &self.settings.classification).is_function(name)
        })
    }

    pub fn is_value_domain(&self, name: &str) -> bool {
        self.current().is_some_and(|snapshot| {
            Classifier::new(&snapshot, &self.settings.classification).is_value_domain(name)
        })
    }
}
