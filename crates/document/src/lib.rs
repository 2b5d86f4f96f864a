//! # Concept Document
//!
//! Document layer for the concept hierarchy engine: identifiers, parsed
//! document trees and the [`DocumentStore`] seam the engine reads
//! through.
//!
//! Documents are loosely-typed JSON trees; [`tree`] provides the
//! shape-tolerant accessors the engine relies on instead of asserting
//! on structure.

mod error;
mod id;
mod store;
pub mod tree;

pub use error::{DocumentError, Result};
pub use id::{join_path, DocumentId};
pub use store::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
pub use tree::DocumentTree;
