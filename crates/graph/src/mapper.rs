//! Filesystem event to delta translation.

use crate::healing::add_or_update_node;
use crate::markdown::parse_markdown_node;
use crate::paths::node_id_for_path;
use crate::types::{Delta, Graph, NodeDelta};
use std::path::{Path, PathBuf};
use voicetree_protocol::FsEvent;

/// Delta for one filesystem observation against the current graph.
///
/// Additions and changes are parsed and healed; a deletion is a single
/// `DeleteNode` carrying the last known node. Edges that pointed at a deleted
/// node keep its id.
pub fn map_fs_event(event: &FsEvent, graph: &Graph, vault_root: &Path) -> Delta {
    match event {
        FsEvent::Added { path, content } | FsEvent::Changed { path, content } => {
            let id = node_id_for_path(vault_root, path);
            let node = parse_markdown_node(&id, content);
            add_or_update_node(node, graph)
        }
        FsEvent::Deleted { path } => {
            let id = node_id_for_path(vault_root, path);
            let deleted = graph.get(&id).cloned();
            vec![NodeDelta::delete_with(id, deleted)]
        }
    }
}

/// [`map_fs_event`] bound to one vault root.
#[derive(Debug, Clone)]
pub struct FsEventMapper {
    vault_root: PathBuf,
}

impl FsEventMapper {
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
        }
    }

    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    pub fn map(&self, event: &FsEvent, graph: &Graph) -> Delta {
        map_fs_event(event, graph, &self.vault_root)
    }
}
