use crate::traversal::root_ids;
use crate::types::{Edge, Graph, NodeId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

/// Structural summary of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,

    /// Edges whose target is not a node (raw links, stale ids)
    pub dangling_edges: usize,

    pub roots: usize,

    /// Strongly connected components with a cycle (size > 1, or a self-link)
    pub cyclic_components: usize,
}

impl Graph {
    /// Edges pointing at `id`, as `(source, edge)` in source key order.
    ///
    /// Derived on every call; incoming edges are never stored.
    pub fn incoming_edges(&self, id: &str) -> Vec<(&NodeId, &Edge)> {
        self.iter()
            .flat_map(|(source, node)| node.outgoing_edges.iter().map(move |edge| (source, edge)))
            .filter(|(_, edge)| edge.target_id == id)
            .collect()
    }

    /// Incoming sources for every node that has any, in one pass.
    pub(crate) fn incoming_index(&self) -> HashMap<&str, Vec<&str>> {
        let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
        for (source, node) in self.iter() {
            for target in node.target_ids() {
                if self.contains(target) {
                    index.entry(target).or_default().push(source.as_str());
                }
            }
        }
        index
    }

    pub fn dangling_edges(&self) -> Vec<(&NodeId, &Edge)> {
        self.iter()
            .flat_map(|(source, node)| node.outgoing_edges.iter().map(move |edge| (source, edge)))
            .filter(|(_, edge)| !self.contains(&edge.target_id))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes().map(|node| node.outgoing_edges.len()).sum()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.len(),
            edges: self.edge_count(),
            dangling_edges: self.dangling_edges().len(),
            roots: root_ids(self).len(),
            cyclic_components: self.cyclic_components().len(),
        }
    }

    /// Node sets of every cycle-carrying strongly connected component, each
    /// sorted, in order of their smallest id.
    pub fn cyclic_components(&self) -> Vec<Vec<NodeId>> {
        let mut digraph: DiGraph<&str, ()> = DiGraph::new();
        let indices: HashMap<&str, NodeIndex> = self
            .ids()
            .map(|id| (id.as_str(), digraph.add_node(id.as_str())))
            .collect();

        let mut self_links = Vec::new();
        for (source, node) in self.iter() {
            for target in node.target_ids() {
                if let (Some(&from), Some(&to)) = (indices.get(source.as_str()), indices.get(target)) {
                    digraph.add_edge(from, to, ());
                    if from == to {
                        self_links.push(from);
                    }
                }
            }
        }

        let mut components: Vec<Vec<NodeId>> = tarjan_scc(&digraph)
            .into_iter()
            .filter(|component| component.len() > 1 || self_links.contains(&component[0]))
            .map(|component| {
                let mut ids: Vec<NodeId> = component.iter().map(|&ix| digraph[ix].to_string()).collect();
                ids.sort();
                ids
            })
            .collect();
        components.sort();
        components
    }
}
