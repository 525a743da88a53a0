//! Delta reduction: the single place where a [`Graph`] changes.

use crate::types::{Delta, Graph, NodeDelta};

/// Fold `delta` into `graph`, left to right.
///
/// Total: deleting an absent id is a no-op, and no rename detection happens
/// (a rename is a delete plus an upsert in the same delta).
#[must_use]
pub fn apply_delta(mut graph: Graph, delta: &[NodeDelta]) -> Graph {
    apply_delta_in_place(&mut graph, delta);
    graph
}

pub fn apply_delta_in_place(graph: &mut Graph, delta: &[NodeDelta]) {
    for node_delta in delta {
        apply_node_delta(graph, node_delta);
    }
}

fn apply_node_delta(graph: &mut Graph, node_delta: &NodeDelta) {
    match node_delta {
        NodeDelta::UpsertNode { node_to_upsert, .. } => {
            let mut node = node_to_upsert.clone();
            // Position is the only field carried over from the node being replaced.
            if node.metadata.position.is_none() {
                if let Some(existing) = graph.get(&node.id) {
                    node.metadata.position = existing.metadata.position;
                }
            }
            graph.insert(node);
        }
        NodeDelta::DeleteNode { node_id, .. } => {
            if graph.remove(node_id).is_none() {
                log::debug!("Delete of unknown node {node_id} ignored");
            }
        }
    }
}

/// Delta that undoes `delta`, built from its advisory payloads.
///
/// Entries come out in reverse order. A delete without `deleted_node` cannot be
/// undone and is skipped.
#[must_use]
pub fn invert_delta(delta: &[NodeDelta]) -> Delta {
    delta
        .iter()
        .rev()
        .filter_map(|node_delta| match node_delta {
            NodeDelta::UpsertNode {
                node_to_upsert,
                previous_node: Some(previous),
            } => Some(NodeDelta::upsert_replacing(
                previous.clone(),
                Some(node_to_upsert.clone()),
            )),
            NodeDelta::UpsertNode {
                node_to_upsert,
                previous_node: None,
            } => Some(NodeDelta::delete_with(
                node_to_upsert.id.clone(),
                Some(node_to_upsert.clone()),
            )),
            NodeDelta::DeleteNode {
                deleted_node: Some(deleted),
                ..
            } => Some(NodeDelta::upsert(deleted.clone())),
            NodeDelta::DeleteNode {
                node_id,
                deleted_node: None,
            } => {
                log::debug!("Cannot invert delete of {node_id}: no deleted node recorded");
                None
            }
        })
        .collect()
}

/// Copy of `delta` without `previous_node`/`deleted_node`, for replay and
/// transport.
#[must_use]
pub fn strip_delta_payloads(delta: &[NodeDelta]) -> Delta {
    delta
        .iter()
        .map(|node_delta| match node_delta {
            NodeDelta::UpsertNode { node_to_upsert, .. } => NodeDelta::upsert(node_to_upsert.clone()),
            NodeDelta::DeleteNode { node_id, .. } => NodeDelta::delete(node_id.clone()),
        })
        .collect()
}
