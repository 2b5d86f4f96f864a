use crate::types::HierarchySnapshot;
use concept_document::{join_path, DocumentId, DocumentStore};
use serde::{Deserialize, Serialize};

impl HierarchySnapshot {
    /// Membership in the defined concept set.
    pub fn is_concept(&self, name: &str) -> bool {
        self.concepts.contains(name)
    }

    /// Reflexive descendant test: a concept classifies as a descendant
    /// of itself.
    pub fn is_descendant_of(&self, name: &str, ancestor: &str) -> bool {
        if !self.is_concept(name) {
            return false;
        }
        name == ancestor
            || self
                .all_ancestors
                .get(name)
                .is_some_and(|ancestors| ancestors.iter().any(|a| a == ancestor))
    }

    pub fn ancestors_of(&self, name: &str) -> &[String] {
        self.all_ancestors
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Well-known root concept names the classifier tests against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationRoots {
    pub function: String,
    pub value_domain: String,
}

impl Default for ClassificationRoots {
    fn default() -> Self {
        Self {
            function: "Function".to_string(),
            value_domain: "ValueDomain".to_string(),
        }
    }
}

/// Header directory chosen by a concept's classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderCategory {
    Functions,
    ValueDomains,
}

impl HeaderCategory {
    pub const fn dir_name(self) -> &'static str {
        match self {
            HeaderCategory::Functions => "functions",
            HeaderCategory::ValueDomains => "valueDomains",
        }
    }
}

/// Classification queries against one snapshot.
///
/// Holds the snapshot reference for its whole lifetime, so a sequence
/// of queries is answered against one consistent model even while a
/// rebuild publishes a new one.
pub struct Classifier<'a> {
    snapshot: &'a HierarchySnapshot,
    roots: &'a ClassificationRoots,
}

impl<'a> Classifier<'a> {
    pub fn new(snapshot: &'a HierarchySnapshot, roots: &'a ClassificationRoots) -> Self {
        Self { snapshot, roots }
    }

    pub fn is_concept(&self, name: &str) -> bool {
        self.snapshot.is_concept(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.snapshot.is_descendant_of(name, &self.roots.function)
    }

    pub fn is_value_domain(&self, name: &str) -> bool {
        self.snapshot.is_descendant_of(name, &self.roots.value_domain)
    }

    /// Directory a header reference of this concept resolves under.
    /// A Function is also a ValueDomain, so Function is tested first.
    pub fn header_category(&self, name: &str) -> Option<HeaderCategory> {
        if self.is_function(name) {
            Some(HeaderCategory::Functions)
        } else if self.is_value_domain(name) {
            Some(HeaderCategory::ValueDomains)
        } else {
            None
        }
    }

    /// Resolve a header value via the fixed
    /// `include/<projectName>/<categoryDir>/` convention.
    pub fn resolve_header(
        &self,
        store: &dyn DocumentStore,
        concept: &str,
        value: &str,
    ) -> Option<DocumentId> {
        let category = self.header_category(concept)?;
        let prefix = join_path(
            &join_path("include", store.project_name()),
            category.dir_name(),
        );
        store.resolve_from_project_root(&join_path(&prefix, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concept_document::MemoryDocumentStore;
    use serde_json::json;
    use std::collections::{BTreeMap, BTreeSet};

    fn snapshot() -> HierarchySnapshot {
        let mut all_ancestors = BTreeMap::new();
        all_ancestors.insert("ValueDomain".to_string(), vec![]);
        all_ancestors.insert("Function".to_string(), vec!["ValueDomain".to_string()]);
        all_ancestors.insert(
            "Sine".to_string(),
            vec!["Function".to_string(), "ValueDomain".to_string()],
        );

        let concepts: BTreeSet<String> = ["ValueDomain", "Function", "Sine"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        HierarchySnapshot {
            root: "root.json".into(),
            included_documents: vec![],
            concepts_by_document: BTreeMap::new(),
            concepts,
            direct_parents: BTreeMap::new(),
            all_ancestors,
            topological_order: vec![
                "ValueDomain".to_string(),
                "Function".to_string(),
                "Sine".to_string(),
            ],
            edges: vec![],
        }
    }

    #[test]
    fn descendant_test_is_reflexive() {
        let snapshot = snapshot();
        assert!(snapshot.is_descendant_of("ValueDomain", "ValueDomain"));
        assert!(snapshot.is_descendant_of("Sine", "ValueDomain"));
        assert!(!snapshot.is_descendant_of("ValueDomain", "Sine"));
        assert!(!snapshot.is_descendant_of("Unknown", "Unknown"));
    }

    #[test]
    fn functions_classify_before_value_domains() {
        let snapshot = snapshot();
        let roots = ClassificationRoots::default();
        let classifier = Classifier::new(&snapshot, &roots);

        // Sine is both; the header category must pick functions.
        assert!(classifier.is_function("Sine"));
        assert!(classifier.is_value_domain("Sine"));
        assert_eq!(
            classifier.header_category("Sine"),
            Some(HeaderCategory::Functions)
        );
        assert_eq!(
            classifier.header_category("ValueDomain"),
            Some(HeaderCategory::ValueDomains)
        );
        assert_eq!(classifier.header_category("Unknown"), None);
    }

    #[test]
    fn header_resolution_uses_project_convention() {
        let snapshot = snapshot();
        let roots = ClassificationRoots::default();
        let classifier = Classifier::new(&snapshot, &roots);
        let store = MemoryDocumentStore::new("robot")
            .with_document("include/robot/functions/sine.json", json!({}));

        assert_eq!(
            classifier.resolve_header(&store, "Sine", "/sine.json"),
            Some("include/robot/functions/sine.json".into())
        );
        assert_eq!(classifier.resolve_header(&store, "Unknown", "sine.json"), None);
    }
}
