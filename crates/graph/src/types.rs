use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node identifier: the note's vault-relative path (e.g. `felix/1.md`).
pub type NodeId = String;

/// Outgoing link of a note.
///
/// `target_id` is either a resolved [`NodeId`] or, while no matching note
/// exists, the raw link text the author typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub target_id: NodeId,

    /// Free text describing the relationship, empty if none
    #[serde(default)]
    pub label: String,
}

impl Edge {
    pub fn new(target_id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            label: label.into(),
        }
    }

    pub fn to(target_id: impl Into<NodeId>) -> Self {
        Self::new(target_id, String::new())
    }

    #[must_use]
    pub fn retarget(&self, target_id: impl Into<NodeId>) -> Self {
        Self::new(target_id, self.label.clone())
    }
}

/// Canvas position of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    /// Generated context-window note rather than an authored one
    #[serde(default)]
    pub is_context_node: bool,

    /// Frontmatter keys without a dedicated field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_props: BTreeMap<String, serde_json::Value>,
}

/// A note. Replaced wholesale on change, never mutated field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    /// Markdown body without frontmatter and link syntax
    pub content: String,

    /// Only source of graph structure; incoming edges are always derived
    #[serde(default)]
    pub outgoing_edges: Vec<Edge>,

    #[serde(default)]
    pub metadata: NodeMetadata,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, content: impl Into<String>) -> Self {
        let id = id.into();
        let title = default_title(&id);
        Self {
            id,
            content: content.into(),
            outgoing_edges: Vec::new(),
            metadata: NodeMetadata {
                title,
                ..NodeMetadata::default()
            },
        }
    }

    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.outgoing_edges.push(edge);
        self
    }

    #[must_use]
    pub fn with_edges(mut self, edges: impl IntoIterator<Item = Edge>) -> Self {
        self.outgoing_edges.extend(edges);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = title.into();
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.metadata.position = Some(position);
        self
    }

    pub fn target_ids(&self) -> impl Iterator<Item = &str> {
        self.outgoing_edges.iter().map(|edge| edge.target_id.as_str())
    }
}

/// Title used when a note carries neither a frontmatter title nor a heading:
/// the file stem of its id.
pub fn default_title(id: &str) -> String {
    let file_name = id.rsplit('/').next().unwrap_or(id);
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => file_name[..dot].to_string(),
        _ => file_name.to_string(),
    }
}

/// Notes keyed by id.
///
/// Every key equals its node's `id`; edges may point at ids that are not keys
/// (dangling links are a valid steady state). Keys iterate in lexicographic
/// order, so everything derived from iteration is independent of the order in
/// which notes arrived.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "GraphRepr")]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
}

#[derive(Deserialize)]
struct GraphRepr {
    #[serde(default)]
    nodes: BTreeMap<NodeId, Node>,
}

impl From<GraphRepr> for Graph {
    fn from(repr: GraphRepr) -> Self {
        Self::from_nodes(repr.nodes.into_values())
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph keyed by each node's own id; later duplicates win.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert(node);
        }
        graph
    }

    /// Insert or replace, returning the previous node at that id
    pub fn insert(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    pub fn remove(&mut self, id: &str) -> Option<Node> {
        self.nodes.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }
}

/// One node-level change.
///
/// `previous_node` and `deleted_node` are advisory (undo, position
/// preservation); reduction never depends on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NodeDelta {
    UpsertNode {
        node_to_upsert: Node,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_node: Option<Node>,
    },
    DeleteNode {
        node_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deleted_node: Option<Node>,
    },
}

/// Ordered batch of node changes; the unit of synchronization.
pub type Delta = Vec<NodeDelta>;

impl NodeDelta {
    pub fn upsert(node: Node) -> Self {
        Self::UpsertNode {
            node_to_upsert: node,
            previous_node: None,
        }
    }

    pub fn upsert_replacing(node: Node, previous: Option<Node>) -> Self {
        Self::UpsertNode {
            node_to_upsert: node,
            previous_node: previous,
        }
    }

    pub fn delete(node_id: impl Into<NodeId>) -> Self {
        Self::DeleteNode {
            node_id: node_id.into(),
            deleted_node: None,
        }
    }

    pub fn delete_with(node_id: impl Into<NodeId>, deleted: Option<Node>) -> Self {
        Self::DeleteNode {
            node_id: node_id.into(),
            deleted_node: deleted,
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Self::UpsertNode { node_to_upsert, .. } => &node_to_upsert.id,
            Self::DeleteNode { node_id, .. } => node_id,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::DeleteNode { .. })
    }
}
