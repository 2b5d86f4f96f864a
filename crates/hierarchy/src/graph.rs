use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Node in the concept graph.
#[derive(Debug, Clone)]
pub struct ConceptNode {
    /// Concept name.
    pub name: String,

    /// Whether a definition was found for this name. Parents that are
    /// only ever referenced stay undefined and are excluded from the
    /// topological order.
    pub defined: bool,
}

/// Directed concept graph: an edge runs from a parent concept to each
/// of its children, with a name index for fast lookup.
pub struct ConceptGraph {
    graph: DiGraph<ConceptNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build the graph from the defined concept set and the declared
    /// direct-parent relation.
    pub fn from_relations<'a>(
        concepts: impl IntoIterator<Item = &'a String>,
        direct_parents: impl IntoIterator<Item = (&'a String, &'a Vec<String>)>,
    ) -> Self {
        let mut graph = Self::new();
        for concept in concepts {
            graph.ensure_node(concept, true);
        }
        for (child, parents) in direct_parents {
            for parent in parents {
                graph.add_parent_edge(parent, child);
            }
        }
        graph
    }

    /// Insert or look up a node, upgrading it to defined if requested.
    pub fn ensure_node(&mut self, name: &str, defined: bool) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            if defined {
                self.graph[idx].defined = true;
            }
            return idx;
        }
        let idx = self.graph.add_node(ConceptNode {
            name: name.to_string(),
            defined,
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Record `parent -> child`. Undeclared parent names become
    /// referenced-only nodes.
    pub fn add_parent_edge(&mut self, parent: &str, child: &str) {
        let parent_idx = self.ensure_node(parent, false);
        let child_idx = self.ensure_node(child, false);
        self.graph.update_edge(parent_idx, child_idx, ());
    }

    pub fn find_node(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ConceptNode {
        &self.graph[idx]
    }

    /// Children of a node (concepts that declare it as a direct parent).
    pub fn children_of(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Number of direct parents that are themselves defined concepts.
    /// Referenced-only parents never get scheduled, so counting them
    /// would deadlock the topological sort.
    pub fn defined_indegree(&self, idx: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter(|&parent| self.graph[parent].defined)
            .count()
    }

    pub fn defined_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].defined)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for ConceptGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = ConceptGraph::new();
        graph.ensure_node("A", true);
        graph.ensure_node("B", true);
        graph.add_parent_edge("A", "B");
        graph.add_parent_edge("A", "B");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn referenced_only_parents_stay_undefined() {
        let mut graph = ConceptGraph::new();
        graph.ensure_node("B", true);
        graph.add_parent_edge("Ghost", "B");

        let ghost = graph.find_node("Ghost").expect("node");
        assert!(!graph.node(ghost).defined);

        let b = graph.find_node("B").expect("node");
        assert_eq!(graph.defined_indegree(b), 0);
    }
}
