//! # VoiceTree Graph
//!
//! In-memory note graph kept consistent with an unordered, incrementally
//! changing set of markdown files.
//!
//! ## Features
//!
//! - **Delta reduction** - every mutation is a [`Delta`] folded by one reducer
//! - **Link resolution** - short wikilinks (`[[1]]`) matched to note paths
//! - **Progressive healing** - dangling links fixed as soon as their target appears
//! - **Order independence** - same files in any arrival order give the same graph
//! - **Context windows** - weighted neighbourhoods serialized in traversal order
//!
//! ## Architecture
//!
//! ```text
//! FsEvent (path, content)
//!     │
//!     ├──> FS-Event Mapper
//!     │      ├─ path -> NodeId
//!     │      ├─ markdown -> Node (raw link targets)
//!     │      └─ Progressive Healing
//!     │             ├─ resolve own links (Edge Resolver)
//!     │             └─ re-resolve nodes linking to the new id
//!     │
//!     ├──> Delta ──> Delta Reducer ──> Graph
//!     │
//!     └──> Graph queries
//!            ├─ Subgraph-by-Distance (out 1.5, in 1.0)
//!            ├─ Traversal Orderer + ASCII tree
//!            └─ Context Assembler
//! ```
//!
//! Everything here is synchronous and free of I/O; the caller owns the single
//! authoritative [`Graph`] and applies events one at a time.

mod context;
mod error;
mod graph;
mod healing;
mod mapper;
mod markdown;
mod paths;
mod reducer;
mod resolver;
mod subgraph;
mod traversal;
mod types;

pub use context::{AssembledContext, ContextAssembler, CONTEXT_EDGE_LABEL, DEFAULT_CONTEXT_MAX_DISTANCE};
pub use error::{GraphError, Result};
pub use graph::GraphStats;
pub use healing::{add_or_update_node, resolve_node_edges, shadowed_links};
pub use mapper::{map_fs_event, FsEventMapper};
pub use markdown::{parse_markdown_node, render_markdown_node};
pub use paths::{node_id_for_path, path_for_node_id};
pub use reducer::{apply_delta, apply_delta_in_place, invert_delta, strip_delta_payloads};
pub use resolver::{resolve_link, resolve_link_detailed, segment_forms, LinkIndex, Resolution, SegmentForm};
pub use subgraph::{extract_subgraph, INCOMING_EDGE_COST, OUTGOING_EDGE_COST};
pub use traversal::{render_ascii_tree, reverse_graph, root_ids, traversal_entries, traversal_order, TraversalEntry};
pub use types::{default_title, Delta, Edge, Graph, Node, NodeDelta, NodeId, NodeMetadata, Position};
