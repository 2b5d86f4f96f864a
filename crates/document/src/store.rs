use crate::error::{DocumentError, Result};
use crate::id::{join_path, DocumentId};
use crate::tree::DocumentTree;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of parsed documents and identifier resolution.
///
/// The engine only ever talks to this trait; production code uses
/// [`FsDocumentStore`], tests use [`MemoryDocumentStore`].
pub trait DocumentStore: Send + Sync {
    /// Read and parse the document behind `id`.
    fn read(&self, id: &DocumentId) -> Result<DocumentTree>;

    /// Resolve a reference written inside `base` against the directory
    /// `base` lives in. `None` when the target does not exist.
    fn resolve_relative(&self, base: &DocumentId, relative_path: &str) -> Option<DocumentId>;

    /// Resolve a path against the project root rather than a document
    /// location. Header references use this convention.
    fn resolve_from_project_root(&self, relative_path: &str) -> Option<DocumentId>;

    /// Resolve a configured path, project-relative or absolute. Root
    /// document settings go through this.
    fn resolve_root(&self, configured_path: &str) -> Option<DocumentId> {
        self.resolve_from_project_root(configured_path)
    }

    /// Name of the project this store serves, used by the
    /// `include/<projectName>/...` header convention.
    fn project_name(&self) -> &str;
}

/// Filesystem-backed store. Identifiers are canonicalized absolute
/// paths, so two references to the same file always compare equal.
pub struct FsDocumentStore {
    project_root: PathBuf,
    project_name: String,
}

impl FsDocumentStore {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let project_name = project_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            project_root,
            project_name,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Mint an identifier for an existing file, absolute or relative to
    /// the project root.
    pub fn document_id(&self, path: impl AsRef<Path>) -> Option<DocumentId> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        canonical_id(&absolute)
    }

    fn read_file(&self, id: &DocumentId) -> Result<String> {
        fs::read_to_string(id.as_str()).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DocumentError::NotFound(id.clone())
            } else {
                DocumentError::Read {
                    id: id.clone(),
                    source,
                }
            }
        })
    }
}

fn canonical_id(path: &Path) -> Option<DocumentId> {
    let canonical = fs::canonicalize(path).ok()?;
    canonical.is_file().then(|| DocumentId::new(canonical.to_string_lossy()))
}

impl DocumentStore for FsDocumentStore {
    fn read(&self, id: &DocumentId) -> Result<DocumentTree> {
        let text = self.read_file(id)?;
        serde_json::from_str(&text).map_err(|source| DocumentError::Parse {
            id: id.clone(),
            source,
        })
    }

    fn resolve_relative(&self, base: &DocumentId, relative_path: &str) -> Option<DocumentId> {
        let relative_path = relative_path.trim();
        if relative_path.is_empty() {
            return None;
        }
        let base_dir = Path::new(base.as_str()).parent()?;
        let target = base_dir.join(relative_path);
        let resolved = canonical_id(&target);
        if resolved.is_none() {
            debug!("Unresolved reference {relative_path} from {base}");
        }
        resolved
    }

    fn resolve_from_project_root(&self, relative_path: &str) -> Option<DocumentId> {
        let relative_path = relative_path.trim().trim_start_matches('/');
        if relative_path.is_empty() {
            return None;
        }
        canonical_id(&self.project_root.join(relative_path))
    }

    fn resolve_root(&self, configured_path: &str) -> Option<DocumentId> {
        let configured_path = configured_path.trim();
        if configured_path.is_empty() {
            return None;
        }
        self.document_id(configured_path)
    }

    fn project_name(&self) -> &str {
        &self.project_name
    }
}

/// In-memory store for hermetic tests and embedding. Identifiers are
/// `/`-separated keys resolved lexically (`.` and `..` are normalized,
/// never touching the filesystem).
#[derive(Default)]
pub struct MemoryDocumentStore {
    project_name: String,
    docs: HashMap<DocumentId, DocumentTree>,
}

impl MemoryDocumentStore {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            docs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: impl Into<DocumentId>, tree: DocumentTree) {
        self.docs.insert(id.into(), tree);
    }

    pub fn with_document(mut self, id: impl Into<DocumentId>, tree: DocumentTree) -> Self {
        self.insert(id, tree);
        self
    }

    fn lookup(&self, key: String) -> Option<DocumentId> {
        let id = DocumentId::new(key);
        self.docs.contains_key(&id).then_some(id)
    }
}

/// Collapse `.` and `..` segments of a `/`-separated path.
fn normalize_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

impl DocumentStore for MemoryDocumentStore {
    fn read(&self, id: &DocumentId) -> Result<DocumentTree> {
        self.docs
            .get(id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(id.clone()))
    }

    fn resolve_relative(&self, base: &DocumentId, relative_path: &str) -> Option<DocumentId> {
        let relative_path = relative_path.trim();
        if relative_path.is_empty() {
            return None;
        }
        let base_dir = match base.as_str().rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };
        self.lookup(normalize_segments(&join_path(base_dir, relative_path)))
    }

    fn resolve_from_project_root(&self, relative_path: &str) -> Option<DocumentId> {
        let relative_path = relative_path.trim();
        if relative_path.is_empty() {
            return None;
        }
        self.lookup(normalize_segments(relative_path))
    }

    fn project_name(&self) -> &str {
        &self.project_name
    }
}
