use crate::error::{Diagnostic, HierarchyError, Result};
use crate::graph::ConceptGraph;
use log::info;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

/// Result of a successful hierarchy build.
#[derive(Debug)]
pub struct BuiltHierarchy {
    /// Transitive ancestors per concept, discovery order, no
    /// duplicates, self excluded.
    pub all_ancestors: BTreeMap<String, Vec<String>>,

    /// All defined concepts, parents before children.
    pub topological_order: Vec<String>,

    pub diagnostics: Vec<Diagnostic>,
}

/// Computes ancestor closures and the topological order from the
/// direct-parent relation, failing on cycles.
pub struct HierarchyBuilder;

impl HierarchyBuilder {
    pub fn build(
        concepts: &BTreeSet<String>,
        direct_parents: &BTreeMap<String, Vec<String>>,
    ) -> Result<BuiltHierarchy> {
        let mut diagnostics = Vec::new();
        for (concept, parents) in direct_parents {
            for parent in parents {
                if !concepts.contains(parent) {
                    diagnostics.push(Diagnostic::UnknownParent {
                        concept: concept.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let all_ancestors = direct_parents
            .keys()
            .map(|concept| (concept.clone(), ancestors_of(concept, direct_parents)))
            .collect();

        let graph = ConceptGraph::from_relations(concepts, direct_parents);
        let topological_order = topological_order(&graph, concepts)?;

        info!(
            "Built hierarchy: {} concepts, {} parent edges",
            concepts.len(),
            graph.edge_count()
        );

        Ok(BuiltHierarchy {
            all_ancestors,
            topological_order,
            diagnostics,
        })
    }
}

/// Iterative depth-first expansion over the direct-parent relation.
///
/// The seen set bounds work on diamond-shaped graphs: each ancestor is
/// expanded once per query, not once per path. Parents that were never
/// defined have no relation entry and simply stop expanding.
fn ancestors_of(start: &str, direct_parents: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut order: Vec<String> = Vec::new();
    let mut stack: Vec<&str> = direct_parents
        .get(start)
        .map(|parents| parents.iter().map(String::as_str).collect())
        .unwrap_or_default();

    while let Some(parent) = stack.pop() {
        if seen.insert(parent) {
            order.push(parent.to_string());
            if let Some(grandparents) = direct_parents.get(parent) {
                stack.extend(grandparents.iter().map(String::as_str));
            }
        }
    }

    order
}

/// Kahn's algorithm over defined concepts. Ties are broken by popping
/// the lexicographically smallest ready name, so repeated builds of
/// the same relation produce the same order. A shortfall against the
/// concept count means at least one cycle; no partial order is ever
/// returned.
fn topological_order(graph: &ConceptGraph, concepts: &BTreeSet<String>) -> Result<Vec<String>> {
    let mut indegree: HashMap<_, _> = graph
        .defined_nodes()
        .map(|idx| (idx, graph.defined_indegree(idx)))
        .collect();

    let mut ready: BinaryHeap<Reverse<(&str, _)>> = indegree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&idx, _)| Reverse((graph.node(idx).name.as_str(), idx)))
        .collect();

    let mut order = Vec::with_capacity(concepts.len());
    while let Some(Reverse((name, idx))) = ready.pop() {
        order.push(name.to_string());
        for child in graph.children_of(idx) {
            // Children are always defined: only defined concepts
            // declare parents.
            if let Some(degree) = indegree.get_mut(&child) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((graph.node(child).name.as_str(), child)));
                }
            }
        }
    }

    if order.len() < concepts.len() {
        let scheduled: BTreeSet<&str> = order.iter().map(String::as_str).collect();
        let remaining: Vec<String> = concepts
            .iter()
            .filter(|concept| !scheduled.contains(concept.as_str()))
            .cloned()
            .collect();
        return Err(HierarchyError::CycleDetected { remaining });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn relations(entries: &[(&str, &[&str])]) -> (BTreeSet<String>, BTreeMap<String, Vec<String>>) {
        let concepts = entries.iter().map(|(name, _)| name.to_string()).collect();
        let parents = entries
            .iter()
            .map(|(name, parents)| {
                (
                    name.to_string(),
                    parents.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        (concepts, parents)
    }

    #[test]
    fn parents_come_before_children() {
        let (concepts, parents) = relations(&[
            ("ValueDomain", &[]),
            ("Function", &["ValueDomain"]),
            ("Sine", &["Function"]),
        ]);

        let built = HierarchyBuilder::build(&concepts, &parents).expect("acyclic");
        let position: BTreeMap<_, _> = built
            .topological_order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        assert!(position["ValueDomain"] < position["Function"]);
        assert!(position["Function"] < position["Sine"]);
        assert_eq!(built.topological_order.len(), concepts.len());
    }

    #[test]
    fn roots_are_scheduled_lexicographically() {
        let (concepts, parents) =
            relations(&[("Zeta", &[]), ("Alpha", &[]), ("Mid", &["Zeta", "Alpha"])]);

        let built = HierarchyBuilder::build(&concepts, &parents).expect("acyclic");
        assert_eq!(built.topological_order, vec!["Alpha", "Zeta", "Mid"]);
    }

    #[test]
    fn diamond_ancestors_appear_once() {
        let (concepts, parents) = relations(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["A"]),
            ("D", &["B", "C"]),
        ]);

        let built = HierarchyBuilder::build(&concepts, &parents).expect("acyclic");
        let ancestors: BTreeSet<_> = built.all_ancestors["D"].iter().cloned().collect();
        assert_eq!(built.all_ancestors["D"].len(), 3);
        assert_eq!(
            ancestors,
            ["A", "B", "C"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn two_node_cycle_fails_with_both_members() {
        let (concepts, parents) = relations(&[("A", &["B"]), ("B", &["A"])]);

        let err = HierarchyBuilder::build(&concepts, &parents).unwrap_err();
        let HierarchyError::CycleDetected { remaining } = err;
        assert_eq!(remaining, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn cycle_does_not_swallow_unrelated_concepts() {
        let (concepts, parents) = relations(&[
            ("Root", &[]),
            ("Loop1", &["Loop2"]),
            ("Loop2", &["Loop1"]),
        ]);

        let err = HierarchyBuilder::build(&concepts, &parents).unwrap_err();
        let HierarchyError::CycleDetected { remaining } = err;
        assert_eq!(remaining, vec!["Loop1".to_string(), "Loop2".to_string()]);
    }

    #[test]
    fn unknown_parent_is_flagged_and_kept_out_of_order() {
        let (concepts, parents) = relations(&[("Child", &["Ghost"])]);

        let built = HierarchyBuilder::build(&concepts, &parents).expect("tolerated");
        assert_eq!(built.topological_order, vec!["Child"]);
        assert_eq!(built.all_ancestors["Child"], vec!["Ghost"]);
        assert_eq!(
            built.diagnostics,
            vec![Diagnostic::UnknownParent {
                concept: "Child".to_string(),
                parent: "Ghost".to_string(),
            }]
        );
    }

    #[test]
    fn repeated_builds_are_deterministic() {
        let (concepts, parents) = relations(&[
            ("Measure", &[]),
            ("Angle", &["Measure"]),
            ("Length", &["Measure"]),
            ("Area", &["Measure"]),
        ]);

        let first = HierarchyBuilder::build(&concepts, &parents).expect("acyclic");
        for _ in 0..5 {
            let next = HierarchyBuilder::build(&concepts, &parents).expect("acyclic");
            assert_eq!(next.topological_order, first.topological_order);
        }
    }
}
