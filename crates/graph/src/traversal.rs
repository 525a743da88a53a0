//! Deterministic depth-first ordering from graph roots, edge reversal and the
//! ASCII tree drawn from both.

use crate::types::{Edge, Graph, Node, NodeId};
use serde::Serialize;
use std::collections::HashSet;

/// Graph with every edge A -> B (B a node) flipped to B -> A, label kept.
///
/// Edges to missing targets have no reverse endpoint and stay on their source.
pub fn reverse_graph(graph: &Graph) -> Graph {
    let mut reversed = Graph::from_nodes(graph.nodes().map(|node| Node {
        outgoing_edges: Vec::new(),
        ..node.clone()
    }));

    for (source, node) in graph.iter() {
        for edge in &node.outgoing_edges {
            let (holder, flipped) = if graph.contains(&edge.target_id) {
                (edge.target_id.as_str(), Edge::new(source.clone(), edge.label.clone()))
            } else {
                (source.as_str(), edge.clone())
            };
            if let Some(node) = reversed.get_mut(holder) {
                node.outgoing_edges.push(flipped);
            }
        }
    }

    reversed
}

/// Nodes with no incoming edge from an existing node, in key order.
///
/// Reversed edges left dangling (raw links of the node itself) do not count.
pub fn root_ids(graph: &Graph) -> Vec<NodeId> {
    reverse_graph(graph)
        .iter()
        .filter(|(_, node)| !node.target_ids().any(|target| graph.contains(target)))
        .map(|(id, _)| id.clone())
        .collect()
}

/// One step of the traversal: a node, its depth under its root, and the label
/// of the edge that led to it (empty for roots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalEntry {
    pub id: NodeId,
    pub depth: usize,
    pub label: String,
}

/// Pre-order walk from every root (key order), children in edge order.
///
/// The visited set is shared across roots: a node reachable from two roots is
/// emitted once, under the first. Components that are pure cycles have no root
/// and are left out.
pub fn traversal_entries(graph: &Graph) -> Vec<TraversalEntry> {
    let roots = root_ids(graph);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut entries = Vec::new();

    for root in &roots {
        if !visited.insert(root.as_str()) {
            continue;
        }
        entries.push(TraversalEntry {
            id: root.clone(),
            depth: 0,
            label: String::new(),
        });

        let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            top.1 += 1;

            let Some(edge) = graph.get(id).and_then(|node| node.outgoing_edges.get(next)) else {
                stack.pop();
                continue;
            };
            let target = edge.target_id.as_str();
            if graph.contains(target) && visited.insert(target) {
                entries.push(TraversalEntry {
                    id: edge.target_id.clone(),
                    depth: stack.len(),
                    label: edge.label.clone(),
                });
                stack.push((target, 0));
            }
        }
    }

    entries
}

/// Node ids in traversal order.
pub fn traversal_order(graph: &Graph) -> Vec<NodeId> {
    traversal_entries(graph).into_iter().map(|entry| entry.id).collect()
}

/// The traversal drawn as a tree, one root per block:
///
/// ```text
/// root.md
/// ├── child.md (extends)
/// │   └── grandchild.md
/// └── other.md
/// ```
pub fn render_ascii_tree(graph: &Graph) -> String {
    let entries = traversal_entries(graph);

    // An entry is last among its siblings if no later entry at the same depth
    // appears before the walk climbs above it.
    let mut is_last = vec![false; entries.len()];
    let mut sibling_follows: Vec<bool> = Vec::new();
    for (index, entry) in entries.iter().enumerate().rev() {
        sibling_follows.resize(entry.depth + 1, false);
        is_last[index] = !sibling_follows[entry.depth];
        sibling_follows[entry.depth] = true;
    }

    let mut out = String::new();
    let mut ancestors_last: Vec<bool> = Vec::new();
    for (entry, &last) in entries.iter().zip(&is_last) {
        ancestors_last.truncate(entry.depth);
        if entry.depth > 0 {
            for &ancestor_last in ancestors_last.iter().skip(1) {
                out.push_str(if ancestor_last { "    " } else { "│   " });
            }
            out.push_str(if last { "└── " } else { "├── " });
        }
        out.push_str(&entry.id);
        if !entry.label.is_empty() {
            out.push_str(&format!(" ({})", entry.label));
        }
        out.push('\n');
        ancestors_last.push(last);
    }
    out
}
