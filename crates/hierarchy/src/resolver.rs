use crate::error::Diagnostic;
use crate::types::{IncludeKind, InclusionEdge, ResolveOptions};
use concept_document::{join_path, tree, DocumentId, DocumentStore, DocumentTree};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Everything one traversal discovered.
pub struct Traversal {
    /// The document the traversal started from.
    pub root: DocumentId,

    /// Every visited document in discovery order, root first.
    pub visited: Vec<DocumentId>,

    /// Every reference found, resolved or not, in discovery order.
    pub edges: Vec<InclusionEdge>,

    /// Parsed content of each visited document, retained so extraction
    /// does not re-read.
    pub documents: HashMap<DocumentId, DocumentTree>,

    /// The mechanism that first discovered each non-root document.
    pub discovered_via: HashMap<DocumentId, IncludeKind>,

    pub diagnostics: Vec<Diagnostic>,
}

impl Traversal {
    /// All reachable documents excluding the root, in discovery order.
    pub fn included_documents(&self) -> Vec<DocumentId> {
        self.visited[1..].to_vec()
    }

    /// Whether a document's top-level entries define concepts: true for
    /// the root and for documents discovered via the `external` list.
    /// Data fragments and headers belong to a single concept and do not
    /// define any themselves.
    pub fn defines_concepts(&self, id: &DocumentId) -> bool {
        *id == self.root || self.discovered_via.get(id) == Some(&IncludeKind::External)
    }
}

/// Depth-first discovery of every document contributing to a hierarchy.
///
/// The traversal uses an explicit stack with a visited set seeded with
/// the root: include graphs are user-authored, so cycles and deep
/// nesting are expected inputs, not errors.
pub struct IncludeResolver<'a> {
    store: &'a dyn DocumentStore,
    options: &'a ResolveOptions,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(store: &'a dyn DocumentStore, options: &'a ResolveOptions) -> Self {
        Self { store, options }
    }

    pub fn traverse(&self, root: DocumentId) -> Traversal {
        let mut traversal = Traversal {
            root: root.clone(),
            visited: vec![root.clone()],
            edges: Vec::new(),
            documents: HashMap::new(),
            discovered_via: HashMap::new(),
            diagnostics: Vec::new(),
        };
        let mut seen: HashSet<DocumentId> = HashSet::new();
        seen.insert(root.clone());
        let mut stack = vec![root];

        while let Some(current) = stack.pop() {
            debug!("Visiting {current}");
            let tree = match self.store.read(&current) {
                Ok(tree) => tree,
                Err(err) => {
                    warn!("Skipping unreadable document {current}: {err}");
                    traversal.diagnostics.push(Diagnostic::MalformedDocument {
                        id: current,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if !tree.is_object() {
                traversal.diagnostics.push(Diagnostic::MalformedDocument {
                    id: current.clone(),
                    reason: "top-level value is not an object".to_string(),
                });
                traversal.documents.insert(current, tree);
                continue;
            }

            self.collect_external(&current, &tree, &mut traversal, &mut seen, &mut stack);
            self.collect_concept_data(&current, &tree, &mut traversal, &mut seen, &mut stack);
            if self.options.resolve_headers {
                self.collect_header(&current, &tree, &mut traversal, &mut seen, &mut stack);
            }

            traversal.documents.insert(current, tree);
        }

        traversal
    }

    /// Document-level `external` list: string or array of strings.
    fn collect_external(
        &self,
        current: &DocumentId,
        tree: &DocumentTree,
        traversal: &mut Traversal,
        seen: &mut HashSet<DocumentId>,
        stack: &mut Vec<DocumentId>,
    ) {
        let keyword = &self.options.keywords.external;
        let Some(value) = tree::property(tree, keyword) else {
            return;
        };
        match tree::path_list(value) {
            Some(paths) => {
                for path in paths {
                    self.follow(current, path, IncludeKind::External, traversal, seen, stack);
                }
            }
            None => traversal.diagnostics.push(Diagnostic::MalformedDocument {
                id: current.clone(),
                reason: format!("`{keyword}` must be a string or an array of strings"),
            }),
        }
    }

    /// Per-entry `data` references, in declaration order. Non-string
    /// `data` values carry inline payloads and are not references.
    fn collect_concept_data(
        &self,
        current: &DocumentId,
        tree: &DocumentTree,
        traversal: &mut Traversal,
        seen: &mut HashSet<DocumentId>,
        stack: &mut Vec<DocumentId>,
    ) {
        let keyword = &self.options.keywords.data;
        for (_, value) in tree::entries(tree) {
            let Some(path) = tree::property(value, keyword).and_then(|data| data.as_str()) else {
                continue;
            };
            self.follow(current, path, IncludeKind::ConceptData, traversal, seen, stack);
        }
    }

    /// Optional `header` reference, resolved against the fixed
    /// `include/<projectName>/` prefix instead of the current document.
    fn collect_header(
        &self,
        current: &DocumentId,
        tree: &DocumentTree,
        traversal: &mut Traversal,
        seen: &mut HashSet<DocumentId>,
        stack: &mut Vec<DocumentId>,
    ) {
        let keyword = &self.options.keywords.header;
        let Some(path) = tree::property(tree, keyword).and_then(|header| header.as_str()) else {
            return;
        };
        let prefixed = join_path(&join_path("include", self.store.project_name()), path);
        let target = self.store.resolve_from_project_root(&prefixed);
        self.record(current, path, target, IncludeKind::Header, traversal, seen, stack);
    }

    fn follow(
        &self,
        current: &DocumentId,
        path: &str,
        kind: IncludeKind,
        traversal: &mut Traversal,
        seen: &mut HashSet<DocumentId>,
        stack: &mut Vec<DocumentId>,
    ) {
        let target = self.store.resolve_relative(current, path);
        self.record(current, path, target, kind, traversal, seen, stack);
    }

    fn record(
        &self,
        current: &DocumentId,
        path: &str,
        target: Option<DocumentId>,
        kind: IncludeKind,
        traversal: &mut Traversal,
        seen: &mut HashSet<DocumentId>,
        stack: &mut Vec<DocumentId>,
    ) {
        traversal.edges.push(InclusionEdge {
            source: current.clone(),
            path: path.to_string(),
            target: target.clone(),
            kind,
        });

        let Some(target) = target else {
            warn!("Unresolved reference {path:?} in {current}");
            traversal.diagnostics.push(Diagnostic::DocumentNotFound {
                source: current.clone(),
                path: path.to_string(),
            });
            return;
        };

        if seen.insert(target.clone()) {
            traversal.visited.push(target.clone());
            traversal.discovered_via.insert(target.clone(), kind);
            stack.push(target);
        }
    }
}
