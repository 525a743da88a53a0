use crate::error::Result;
use crate::loader::VaultSnapshot;
use crate::writer::DiskWriter;
use std::path::{Path, PathBuf};
use voicetree_graph::{apply_delta_in_place, Delta, FsEventMapper, Graph, NodeDelta};
use voicetree_protocol::FsEvent;

/// The single authoritative graph of a vault.
///
/// Every change goes through [`GraphStore::apply_event`] or
/// [`GraphStore::commit`], one at a time; whoever owns the store serializes
/// access to it.
#[derive(Debug, Clone)]
pub struct GraphStore {
    mapper: FsEventMapper,
    graph: Graph,
}

impl GraphStore {
    pub fn new(root: impl Into<PathBuf>, graph: Graph) -> Self {
        Self {
            mapper: FsEventMapper::new(root),
            graph,
        }
    }

    pub fn from_snapshot(snapshot: VaultSnapshot) -> Self {
        Self::new(snapshot.root, snapshot.graph)
    }

    pub fn root(&self) -> &Path {
        self.mapper.vault_root()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Map `event` against the current graph, apply it, and return the delta.
    pub fn apply_event(&mut self, event: &FsEvent) -> Delta {
        let delta = self.mapper.map(event, &self.graph);
        apply_delta_in_place(&mut self.graph, &delta);
        log::debug!(
            "Applied {:?} {} ({} node changes)",
            event.kind(),
            event.path().display(),
            delta.len()
        );
        delta
    }

    /// Persist `delta` through `writer`, then apply what it reports applied.
    ///
    /// A write failure leaves the graph untouched and propagates.
    pub fn commit(&mut self, delta: &[NodeDelta], writer: &dyn DiskWriter) -> Result<Delta> {
        let applied = writer.write_delta(delta)?;
        apply_delta_in_place(&mut self.graph, &applied);
        Ok(applied)
    }
}
