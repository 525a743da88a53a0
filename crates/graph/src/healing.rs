//! Progressive healing: resolving a node's own links on insertion and
//! re-resolving every other node that referenced it before it existed.

use crate::resolver::{segment_forms, LinkIndex};
use crate::types::{Delta, Edge, Graph, Node, NodeDelta, NodeId};
use std::collections::{HashMap, HashSet};

/// Delta that inserts or replaces `node` and heals every node linking to it.
///
/// The first entry is always the upsert of `node` itself (carrying the node
/// it replaces, if any). It is followed by one upsert per healed node, in key
/// order, for nodes whose edges actually changed.
pub fn add_or_update_node(node: Node, graph: &Graph) -> Delta {
    let mut index = LinkIndex::from_graph(graph);
    index.insert(&node.id);

    let node = resolve_node_edges(node, &index);
    let previous = graph.get(&node.id).cloned();
    if previous.is_none() {
        for (source, edge) in shadowed_links(&node.id, graph) {
            log::warn!(
                "Link {source} -> {} may have been written in a form that now resolves to {}; \
                 resolved links are not re-resolved, reload the vault to pick it up",
                edge.target_id,
                node.id
            );
        }
    }

    let forms: HashSet<String> = segment_forms(&node.id)
        .into_iter()
        .map(|segment| segment.form)
        .collect();

    let mut delta = Vec::new();
    for other in graph.nodes() {
        if other.id == node.id || !other.target_ids().any(|target| forms.contains(target)) {
            continue;
        }
        let healed = resolve_node_edges(other.clone(), &index);
        if healed.outgoing_edges != other.outgoing_edges {
            log::debug!("Healed links of {} towards {}", other.id, node.id);
            delta.push(NodeDelta::upsert_replacing(healed, Some(other.clone())));
        }
    }

    delta.insert(0, NodeDelta::upsert_replacing(node, previous));
    delta
}

/// Resolved links a new note `new_id` would have won had it existed first.
///
/// A resolved edge no longer carries the text it was written as. If some
/// short form of its target is also a form of `new_id`, ranked better for
/// `new_id`, the link may have been written that way, and would now resolve
/// to `new_id`. Healing never revisits such edges, so the graph can differ
/// from one loaded in another order. Reported as `(source, edge)` in key order.
pub fn shadowed_links(new_id: &str, graph: &Graph) -> Vec<(NodeId, Edge)> {
    let new_forms: HashMap<String, usize> = segment_forms(new_id)
        .into_iter()
        .map(|segment| (segment.form, segment.stripped))
        .collect();

    let mut shadowed = Vec::new();
    for (source, node) in graph.iter() {
        for edge in &node.outgoing_edges {
            let target = edge.target_id.as_str();
            if target == new_id || !graph.contains(target) {
                continue;
            }
            let outranked = segment_forms(target).into_iter().any(|segment| {
                new_forms
                    .get(&segment.form)
                    .is_some_and(|&stripped| (stripped, new_id) < (segment.stripped, target))
            });
            if outranked {
                shadowed.push((source.clone(), edge.clone()));
            }
        }
    }
    shadowed
}

/// Re-resolve every outgoing edge of `node`; unresolved edges keep their raw
/// target text.
pub fn resolve_node_edges(mut node: Node, index: &LinkIndex) -> Node {
    node.outgoing_edges = node
        .outgoing_edges
        .iter()
        .map(|edge| resolve_edge(&node.id, edge, index))
        .collect();
    node
}

fn resolve_edge(source: &str, edge: &Edge, index: &LinkIndex) -> Edge {
    match index.resolve_detailed(&edge.target_id) {
        Some(resolution) => {
            if resolution.is_ambiguous() {
                log::warn!(
                    "Ambiguous link '{}' in {}: chose {} over {:?}",
                    edge.target_id,
                    source,
                    resolution.target,
                    resolution.ambiguous_with
                );
            } else if resolution.has_alternatives() && resolution.target != edge.target_id {
                log::warn!(
                    "Link '{}' in {} resolved to {}, also matches {:?}",
                    edge.target_id,
                    source,
                    resolution.target,
                    resolution.alternatives
                );
            }
            edge.retarget(resolution.target)
        }
        None => edge.clone(),
    }
}
