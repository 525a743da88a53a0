use crate::error::{GraphError, Result};
use crate::subgraph::extract_subgraph;
use crate::traversal::{render_ascii_tree, traversal_order};
use crate::types::{Edge, Graph, Node, NodeId};

/// Radius used when the caller does not pick one
pub const DEFAULT_CONTEXT_MAX_DISTANCE: f64 = 7.0;

/// Label of the edge from a generated context node to the node it describes
pub const CONTEXT_EDGE_LABEL: &str = "context for";

/// Builds AI context windows around a node
///
/// Neighbourhood by weighted distance, ordered by the traversal orderer,
/// serialized as an ASCII tree followed by node contents.
pub struct ContextAssembler<'a> {
    graph: &'a Graph,
    max_distance: f64,
}

/// Assembled context for one start node
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub start_id: NodeId,

    /// Nodes in serialization order; always contains `start_id`
    pub node_ids: Vec<NodeId>,

    pub subgraph: Graph,

    pub text: String,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            max_distance: DEFAULT_CONTEXT_MAX_DISTANCE,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn assemble(&self, start_id: &str) -> Result<AssembledContext> {
        if !self.graph.contains(start_id) {
            return Err(GraphError::NodeNotFound(start_id.to_string()));
        }

        let subgraph = extract_subgraph(self.graph, start_id, self.max_distance);
        let mut node_ids = traversal_order(&subgraph);
        // The start node sits on a cycle with no way in, or the budget
        // excluded everything (including itself).
        if !node_ids.iter().any(|id| id == start_id) {
            node_ids.push(start_id.to_string());
        }

        let text = self.render_text(start_id, &subgraph, &node_ids);
        log::debug!(
            "Assembled context for {start_id}: {} nodes within {}",
            node_ids.len(),
            self.max_distance
        );

        Ok(AssembledContext {
            start_id: start_id.to_string(),
            node_ids,
            subgraph,
            text,
        })
    }

    fn render_text(&self, start_id: &str, subgraph: &Graph, node_ids: &[NodeId]) -> String {
        let mut text = String::from("=== TREE STRUCTURE ===\n");
        text.push_str(&render_ascii_tree(subgraph));
        text.push_str("\n=== NODE CONTENTS ===\n");

        for (position, id) in node_ids.iter().enumerate() {
            let Some(node) = subgraph.get(id).or_else(|| self.graph.get(id)) else {
                continue;
            };
            let marker = if id == start_id { " [*]" } else { "" };
            text.push_str(&format!(
                "[{}] {} ({}){}\n",
                position + 1,
                node.metadata.title,
                id,
                marker
            ));
            if !node.content.trim().is_empty() {
                text.push_str(node.content.trim_end());
                text.push('\n');
            }
            text.push('\n');
        }

        text
    }
}

impl AssembledContext {
    /// Generated note holding this context, linked to the start node.
    pub fn into_context_node(self, id: impl Into<NodeId>) -> Node {
        let title = self
            .subgraph
            .get(&self.start_id)
            .map_or_else(|| self.start_id.clone(), |node| node.metadata.title.clone());

        let mut node = Node::new(id, self.text)
            .with_title(format!("Context for {title}"))
            .with_edge(Edge::new(self.start_id, CONTEXT_EDGE_LABEL));
        node.metadata.is_context_node = true;
        node
    }
}
