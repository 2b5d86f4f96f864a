//! # Concept Hierarchy
//!
//! Hierarchy resolution engine: builds an in-memory model of a concept
//! hierarchy spread across linked documents and answers classification
//! queries against it.
//!
//! ## Architecture
//!
//! ```text
//! DocumentStore (filesystem / in-memory)
//!     │
//!     ├──> Include Resolver (DFS, cycle-safe)
//!     │      ├─ document-level "external" lists
//!     │      ├─ per-concept "data" references
//!     │      └─ optional "header" references
//!     │
//!     ├──> Concept Extractor
//!     │      ├─ top-level entries -> concepts
//!     │      └─ "directParents" arrays -> parent relation
//!     │
//!     ├──> Hierarchy Builder (petgraph)
//!     │      ├─ transitive ancestor closure per concept
//!     │      ├─ deterministic topological order
//!     │      └─ cycle detection
//!     │
//!     └──> Hierarchy Snapshot (immutable)
//!            └─ classification queries (is-concept, is-descendant-of)
//! ```
//!
//! Per-document and per-reference problems are accumulated as
//! [`Diagnostic`]s and never abort a build; only a cycle in the parent
//! relation is fatal.

mod builder;
mod error;
mod extractor;
mod graph;
mod query;
mod resolver;
mod types;

pub use builder::{BuiltHierarchy, HierarchyBuilder};
pub use error::{Diagnostic, HierarchyError, Result};
pub use extractor::{ConceptExtractor, Extraction};
pub use graph::{ConceptGraph, ConceptNode};
pub use query::{ClassificationRoots, Classifier, HeaderCategory};
pub use resolver::{IncludeResolver, Traversal};
pub use types::{HierarchySnapshot, IncludeKind, InclusionEdge, Keywords, ResolveOptions};

use concept_document::{DocumentId, DocumentStore};
use std::collections::BTreeSet;

/// A built snapshot together with everything non-fatal that was
/// noticed along the way.
#[derive(Debug)]
pub struct BuildOutcome {
    pub snapshot: HierarchySnapshot,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline: traverse the document graph from `root`,
/// extract concepts, build ancestor sets and the topological order,
/// and assemble an immutable snapshot.
pub fn build_snapshot(
    store: &dyn DocumentStore,
    root: DocumentId,
    options: &ResolveOptions,
) -> Result<BuildOutcome> {
    let traversal = IncludeResolver::new(store, options).traverse(root);
    let extraction = ConceptExtractor::new(&options.keywords).extract_all(&traversal);

    let concepts: BTreeSet<String> = extraction
        .concepts_by_document
        .values()
        .flatten()
        .cloned()
        .collect();

    let built = HierarchyBuilder::build(&concepts, &extraction.direct_parents)?;

    let included_documents = traversal.included_documents();
    let mut diagnostics = traversal.diagnostics;
    diagnostics.extend(extraction.diagnostics);
    diagnostics.extend(built.diagnostics);

    let snapshot = HierarchySnapshot {
        included_documents,
        root: traversal.root,
        concepts_by_document: extraction.concepts_by_document,
        concepts,
        direct_parents: extraction.direct_parents,
        all_ancestors: built.all_ancestors,
        topological_order: built.topological_order,
        edges: traversal.edges,
    };

    Ok(BuildOutcome {
        snapshot,
        diagnostics,
    })
}
