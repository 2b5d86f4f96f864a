use crate::DocumentId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Failed to read {id}: {source}")]
    Read {
        id: DocumentId,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {id}: {source}")]
    Parse {
        id: DocumentId,
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    /// Whether the error means the document simply does not exist,
    /// as opposed to existing but being unreadable or unparsable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::NotFound(_))
    }
}
