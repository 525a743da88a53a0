//! The one mapping between file paths and node ids.
//!
//! Bulk load and watch events must both go through [`node_id_for_path`];
//! anything else breaks order independence.

use crate::error::{GraphError, Result};
use crate::types::NodeId;
use std::path::{Component, Path, PathBuf};

/// Vault-relative path with forward slashes, extension kept.
///
/// Paths outside `vault_root` fall back to their full path string.
pub fn node_id_for_path(vault_root: &Path, path: &Path) -> NodeId {
    match path.strip_prefix(vault_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => join_components(relative),
        _ => path.to_string_lossy().replace('\\', "/"),
    }
}

fn join_components(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Location on disk of the note with `id`.
///
/// Ids escaping the vault (`..` segments, absolute paths) are rejected.
pub fn path_for_node_id(vault_root: &Path, id: &str) -> Result<PathBuf> {
    let relative = Path::new(id);
    if id.is_empty() || relative.is_absolute() || id.starts_with('/') {
        return Err(GraphError::InvalidPath(id.to_string()));
    }

    let mut path = vault_root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return Err(GraphError::InvalidPath(id.to_string())),
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_relative_with_forward_slashes() {
        let root = Path::new("/vault");
        assert_eq!(node_id_for_path(root, Path::new("/vault/felix/1.md")), "felix/1.md");
        assert_eq!(node_id_for_path(root, Path::new("/vault/top.md")), "top.md");
    }

    #[test]
    fn outside_vault_falls_back_to_absolute() {
        let root = Path::new("/vault");
        assert_eq!(node_id_for_path(root, Path::new("/elsewhere/x.md")), "/elsewhere/x.md");
    }

    #[test]
    fn id_round_trips_to_path() {
        let root = Path::new("/vault");
        let path = path_for_node_id(root, "felix/1.md").unwrap();
        assert_eq!(path, PathBuf::from("/vault/felix/1.md"));
        assert_eq!(node_id_for_path(root, &path), "felix/1.md");
    }

    #[test]
    fn escaping_ids_are_rejected() {
        let root = Path::new("/vault");
        assert!(matches!(path_for_node_id(root, "../x.md"), Err(GraphError::InvalidPath(_))));
        assert!(matches!(path_for_node_id(root, "/etc/passwd"), Err(GraphError::InvalidPath(_))));
        assert!(matches!(path_for_node_id(root, ""), Err(GraphError::InvalidPath(_))));
    }
}
