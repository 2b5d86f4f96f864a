use concept_document::DocumentId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reserved property names recognized during traversal and extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keywords {
    /// Document-level ordered list of included documents.
    pub external: String,

    /// Per-concept single reference to an external data fragment.
    pub data: String,

    /// Per-concept ordered list of direct parent concept names.
    pub direct_parents: String,

    /// Optional single reference resolved via the project-level
    /// `include/<projectName>/...` convention.
    pub header: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            external: "external".to_string(),
            data: "data".to_string(),
            direct_parents: "directParents".to_string(),
            header: "header".to_string(),
        }
    }
}

/// Traversal configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub keywords: Keywords,

    /// Also follow `header` references during traversal.
    pub resolve_headers: bool,
}

/// Which mechanism a reference was declared through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeKind {
    /// Entry of the document-level `external` list.
    External,

    /// `data` reference scoped to one concept entry.
    ConceptData,

    /// `header` reference resolved from the project root.
    Header,
}

/// One "this document references that document" fact.
///
/// `target` is `None` when resolution failed; dangling references are
/// recorded, not discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InclusionEdge {
    pub source: DocumentId,
    pub path: String,
    pub target: Option<DocumentId>,
    pub kind: IncludeKind,
}

impl InclusionEdge {
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// One immutable, fully-built hierarchy model.
///
/// Snapshots are produced only by a successful build and published by
/// whole-value swap; readers never observe a partially-built state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchySnapshot {
    /// Document the traversal started from.
    pub root: DocumentId,

    /// All reachable documents excluding the root, in discovery order.
    pub included_documents: Vec<DocumentId>,

    /// Concepts per defining document. A duplicated concept appears
    /// under every document that mentions it.
    pub concepts_by_document: BTreeMap<DocumentId, BTreeSet<String>>,

    /// Union of all defined concepts.
    pub concepts: BTreeSet<String>,

    /// Declared direct parents per concept, in declaration order.
    pub direct_parents: BTreeMap<String, Vec<String>>,

    /// Transitive ancestors per concept: discovery order, duplicates
    /// removed, the concept itself excluded. Not a canonical order;
    /// callers needing set semantics must not depend on it.
    pub all_ancestors: BTreeMap<String, Vec<String>>,

    /// All concepts, parents before children, lexicographic tie-break.
    pub topological_order: Vec<String>,

    /// Every inclusion edge discovered during traversal, resolved or
    /// not, in discovery order.
    pub edges: Vec<InclusionEdge>,
}

impl HierarchySnapshot {
    /// Documents whose change should invalidate this snapshot: the
    /// root plus everything it transitively included.
    pub fn contributing_documents(&self) -> impl Iterator<Item = &DocumentId> {
        std::iter::once(&self.root).chain(self.included_documents.iter())
    }

    pub fn unresolved_edges(&self) -> impl Iterator<Item = &InclusionEdge> {
        self.edges.iter().filter(|edge| !edge.is_resolved())
    }
}
