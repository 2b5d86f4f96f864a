use crate::error::Diagnostic;
use crate::resolver::Traversal;
use crate::types::Keywords;
use concept_document::{tree, DocumentId, DocumentTree};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate of all concept definitions discovered in one traversal.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Concepts per document, including repeat mentions of duplicated
    /// names.
    pub concepts_by_document: BTreeMap<DocumentId, BTreeSet<String>>,

    /// First-wins direct-parent relation.
    pub direct_parents: BTreeMap<String, Vec<String>>,

    /// Document whose definition won, per concept.
    pub defining_document: BTreeMap<String, DocumentId>,

    pub diagnostics: Vec<Diagnostic>,
}

/// Pulls concept definitions out of concept-defining documents.
pub struct ConceptExtractor<'a> {
    keywords: &'a Keywords,
}

impl<'a> ConceptExtractor<'a> {
    pub fn new(keywords: &'a Keywords) -> Self {
        Self { keywords }
    }

    /// Concept definitions of a single document, in declaration order.
    ///
    /// Every top-level entry except the reserved `external` keyword
    /// defines a concept; its direct parents come from a
    /// `directParents` array on the entry's object value, absent or
    /// differently-shaped meaning none.
    pub fn extract(&self, content: &DocumentTree) -> Vec<(String, Vec<String>)> {
        tree::entries(content)
            .filter(|(name, _)| *name != self.keywords.external)
            .map(|(name, value)| (name.to_string(), self.direct_parents_of(value)))
            .collect()
    }

    fn direct_parents_of(&self, value: &serde_json::Value) -> Vec<String> {
        tree::property(value, &self.keywords.direct_parents)
            .and_then(|parents| parents.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Extract from every concept-defining document of a traversal, in
    /// discovery order. The first definition of a name wins; repeats
    /// are recorded under their document and flagged.
    pub fn extract_all(&self, traversal: &Traversal) -> Extraction {
        let mut extraction = Extraction::default();

        for id in &traversal.visited {
            if !traversal.defines_concepts(id) {
                continue;
            }
            // Unreadable and non-object documents were already
            // diagnosed by the traversal.
            let Some(content) = traversal.documents.get(id) else {
                continue;
            };
            if !content.is_object() {
                continue;
            }

            for (name, parents) in self.extract(content) {
                extraction
                    .concepts_by_document
                    .entry(id.clone())
                    .or_default()
                    .insert(name.clone());

                if let Some(first) = extraction.defining_document.get(&name) {
                    warn!("Ignoring duplicate concept {name:?} in {id} (first defined in {first})");
                    extraction.diagnostics.push(Diagnostic::DuplicateConcept {
                        name,
                        first: first.clone(),
                        duplicate: id.clone(),
                    });
                } else {
                    extraction.defining_document.insert(name.clone(), id.clone());
                    extraction.direct_parents.insert(name, parents);
                }
            }
        }

        extraction
    }
}
