use concept_document::DocumentId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HierarchyError>;

/// Fatal build errors. Everything else encountered during a rebuild is
/// accumulated as a [`Diagnostic`] and does not abort the build.
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// The direct-parent relation contains at least one cycle; the
    /// concepts that could not be scheduled are listed sorted.
    #[error("Cycle detected among concepts: {}", remaining.join(", "))]
    CycleDetected { remaining: Vec<String> },
}

/// Non-fatal findings accumulated while building a hierarchy.
///
/// Diagnostics maximize partial information: a dangling reference or a
/// malformed document degrades the result, it never discards the
/// concepts that did resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A reference could not be resolved to an existing document.
    DocumentNotFound { source: DocumentId, path: String },

    /// A document could not be read, or its shape defeated extraction.
    MalformedDocument { id: DocumentId, reason: String },

    /// The same concept name is defined in two documents. The first
    /// definition wins.
    DuplicateConcept {
        name: String,
        first: DocumentId,
        duplicate: DocumentId,
    },

    /// A declared direct parent is never defined anywhere. The name
    /// stays in ancestor sets but is never expanded and never appears
    /// in the topological order.
    UnknownParent { concept: String, parent: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DocumentNotFound { source, path } => {
                write!(f, "unresolved reference {path:?} in {source}")
            }
            Diagnostic::MalformedDocument { id, reason } => {
                write!(f, "malformed document {id}: {reason}")
            }
            Diagnostic::DuplicateConcept {
                name,
                first,
                duplicate,
            } => {
                write!(
                    f,
                    "duplicate concept {name:?} in {duplicate} (first defined in {first})"
                )
            }
            Diagnostic::UnknownParent { concept, parent } => {
                write!(f, "concept {concept:?} declares unknown parent {parent:?}")
            }
        }
    }
}
