use crate::error::{IndexerError, Result};
use std::path::{Path, PathBuf};
use voicetree_graph::{path_for_node_id, render_markdown_node, Delta, NodeDelta};

/// Persists deltas to the vault
///
/// Returns the applied delta on success. Failures are reported, never retried.
pub trait DiskWriter: Send + Sync {
    fn write_delta(&self, delta: &[NodeDelta]) -> Result<Delta>;
}

/// Writes each upsert as a markdown file and removes deleted notes' files.
///
/// Fail-fast: deleting a file that does not exist, or writing into a
/// directory that does not exist, is an error. Entries before the failing one
/// stay written.
#[derive(Debug, Clone)]
pub struct MarkdownDiskWriter {
    root: PathBuf,
}

impl MarkdownDiskWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_one(&self, node_delta: &NodeDelta) -> Result<()> {
        let path = path_for_node_id(&self.root, node_delta.node_id())?;
        match node_delta {
            NodeDelta::UpsertNode { node_to_upsert, .. } => {
                let parent_exists = path.parent().is_some_and(Path::is_dir);
                if !parent_exists {
                    return Err(IndexerError::Write(format!(
                        "directory of {} does not exist",
                        path.display()
                    )));
                }
                let rendered = render_markdown_node(node_to_upsert)?;
                std::fs::write(&path, rendered)
                    .map_err(|e| IndexerError::Write(format!("{}: {e}", path.display())))?;
                log::debug!("Wrote {}", path.display());
            }
            NodeDelta::DeleteNode { node_id, .. } => {
                if !path.is_file() {
                    return Err(IndexerError::Write(format!(
                        "cannot delete {node_id}: {} does not exist",
                        path.display()
                    )));
                }
                std::fs::remove_file(&path)
                    .map_err(|e| IndexerError::Write(format!("{}: {e}", path.display())))?;
                log::debug!("Removed {}", path.display());
            }
        }
        Ok(())
    }
}

impl DiskWriter for MarkdownDiskWriter {
    fn write_delta(&self, delta: &[NodeDelta]) -> Result<Delta> {
        for node_delta in delta {
            self.write_one(node_delta)?;
        }
        Ok(delta.to_vec())
    }
}
