//! Bounded neighbourhood extraction for context windows.

use crate::types::Graph;
use std::collections::HashSet;

/// Cost of following an edge forwards, towards a child
pub const OUTGOING_EDGE_COST: f64 = 1.5;

/// Cost of following an edge backwards, towards a parent
pub const INCOMING_EDGE_COST: f64 = 1.0;

/// Nodes within `max_distance` of `start_id` (strictly less than), with the
/// edges between them.
///
/// Depth-first, each node expanded at most once: the distance it was first
/// reached at wins even if a shorter route exists. A node reached over budget
/// is not marked visited, so a later in-budget route can still include it.
/// Outgoing edges are explored before incoming ones.
pub fn extract_subgraph(graph: &Graph, start_id: &str, max_distance: f64) -> Graph {
    // Also rejects NaN.
    if !graph.contains(start_id) || !(max_distance > 0.0) {
        return Graph::new();
    }

    let incoming = graph.incoming_index();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<(&str, f64)> = vec![(start_id, 0.0)];

    while let Some((id, distance)) = stack.pop() {
        if distance >= max_distance || visited.contains(id) {
            continue;
        }
        let Some(node) = graph.get(id) else {
            continue;
        };
        visited.insert(id);

        // Pushed in reverse so the first outgoing edge is popped first.
        let mut next = Vec::new();
        for target in node.target_ids() {
            if graph.contains(target) && !visited.contains(target) {
                next.push((target, distance + OUTGOING_EDGE_COST));
            }
        }
        for &source in incoming.get(id).into_iter().flatten() {
            if !visited.contains(source) {
                next.push((source, distance + INCOMING_EDGE_COST));
            }
        }
        stack.extend(next.into_iter().rev());
    }

    Graph::from_nodes(visited.iter().filter_map(|id| graph.get(id)).map(|node| {
        let mut node = node.clone();
        node.outgoing_edges
            .retain(|edge| visited.contains(edge.target_id.as_str()));
        node
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, Node};
    use pretty_assertions::assert_eq;

    fn ids(graph: &Graph) -> Vec<&str> {
        graph.ids().map(String::as_str).collect()
    }

    /// parent -> start -> child -> grandchild
    fn chain() -> Graph {
        Graph::from_nodes([
            Node::new("parent.md", "").with_edge(Edge::to("start.md")),
            Node::new("start.md", "").with_edge(Edge::to("child.md")),
            Node::new("child.md", "").with_edge(Edge::to("grandchild.md")),
            Node::new("grandchild.md", ""),
        ])
    }

    #[test]
    fn boundary_is_strict() {
        let graph = chain();
        assert_eq!(ids(&extract_subgraph(&graph, "start.md", 1.0)), vec!["start.md"]);
        assert_eq!(
            ids(&extract_subgraph(&graph, "start.md", 1.5)),
            vec!["parent.md", "start.md"]
        );
        assert_eq!(
            ids(&extract_subgraph(&graph, "start.md", 1.6)),
            vec!["child.md", "parent.md", "start.md"]
        );
    }

    #[test]
    fn mixed_directions_accumulate_cost() {
        let graph = chain();
        // start -> child -> grandchild costs 3.0.
        let sub = extract_subgraph(&graph, "start.md", 3.5);
        assert_eq!(ids(&sub), vec!["child.md", "grandchild.md", "parent.md", "start.md"]);
        let sub = extract_subgraph(&graph, "start.md", 3.0);
        assert!(!sub.contains("grandchild.md"));
    }

    #[test]
    fn edges_leaving_the_set_are_dropped() {
        let graph = chain();
        let sub = extract_subgraph(&graph, "start.md", 1.6);
        assert!(sub.get("child.md").unwrap().outgoing_edges.is_empty());
        assert_eq!(sub.get("start.md").unwrap().outgoing_edges, vec![Edge::to("child.md")]);
    }

    #[test]
    fn unknown_start_or_empty_budget_yields_empty_graph() {
        let graph = chain();
        assert!(extract_subgraph(&graph, "nope.md", 10.0).is_empty());
        assert!(extract_subgraph(&graph, "start.md", 0.0).is_empty());
        assert!(extract_subgraph(&graph, "start.md", f64::NAN).is_empty());
    }

    #[test]
    fn cycles_terminate() {
        let graph = Graph::from_nodes([
            Node::new("a.md", "").with_edge(Edge::to("b.md")),
            Node::new("b.md", "").with_edge(Edge::to("a.md")),
        ]);
        let sub = extract_subgraph(&graph, "a.md", 100.0);
        assert_eq!(sub, graph);
    }

    #[test]
    fn first_discovered_distance_wins() {
        // y is first reached through x at 3.0, not as start's parent at 1.0,
        // which puts its parent z at 4.0.
        let graph = Graph::from_nodes([
            Node::new("start.md", "").with_edge(Edge::to("x.md")),
            Node::new("x.md", "").with_edge(Edge::to("y.md")),
            Node::new("y.md", "").with_edge(Edge::to("start.md")),
            Node::new("z.md", "").with_edge(Edge::to("y.md")),
        ]);
        let sub = extract_subgraph(&graph, "start.md", 3.5);
        assert!(sub.contains("y.md"));
        assert!(!sub.contains("z.md"));
    }
}
